//! Synthetic archive and stream index writers for integration tests

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use binrw::BinWriterExt;
use decima_formats::archive::constants::{ARCHIVE_MAGIC, BLOCK_SIZE, PREFIX_SIZE, RECORD_SIZE};
use decima_formats::stream_index::STREAM_INDEX_MAGIC;
use decima_formats::{ArchiveHeader, Block, Codec, Record, fingerprint};
use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Builds an archive whose payload is the concatenation of its files
pub struct ArchiveBuilder {
    load_priority: i32,
    max_block_size: usize,
    codec: Codec,
    files: Vec<(u64, Vec<u8>)>,
    block_limit: Option<usize>,
}

impl ArchiveBuilder {
    pub fn new(load_priority: i32, max_block_size: usize) -> Self {
        Self {
            load_priority,
            max_block_size,
            codec: Codec::Zlib,
            files: Vec::new(),
            block_limit: None,
        }
    }

    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn file(self, path: &str, data: &[u8]) -> Self {
        self.fingerprinted(fingerprint(path), data)
    }

    pub fn fingerprinted(mut self, fp: u64, data: &[u8]) -> Self {
        self.files.push((fp, data.to_vec()));
        self
    }

    /// Keep only the first `count` blocks in the block table
    pub fn block_limit(mut self, count: usize) -> Self {
        self.block_limit = Some(count);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        let mut records = Vec::new();
        for (file_id, (fp, data)) in self.files.iter().enumerate() {
            records.push(Record {
                file_id: file_id as i32,
                reserved1: 0,
                fingerprint: *fp,
                logical_offset: payload.len() as i64,
                logical_size: data.len() as i32,
                reserved2: 0,
            });
            payload.extend_from_slice(data);
        }

        let mut chunks: Vec<(usize, Vec<u8>)> = payload
            .chunks(self.max_block_size)
            .map(|chunk| (chunk.len(), self.compress(chunk)))
            .collect();
        if let Some(limit) = self.block_limit {
            chunks.truncate(limit);
        }

        let mut data_offset = PREFIX_SIZE + records.len() * RECORD_SIZE + chunks.len() * BLOCK_SIZE;
        let blocks: Vec<Block> = chunks
            .iter()
            .enumerate()
            .map(|(i, (raw_len, compressed))| {
                let block = Block {
                    decompressed_offset: (i * self.max_block_size) as i64,
                    decompressed_size: *raw_len as i32,
                    reserved1: 0,
                    compressed_offset: data_offset as i64,
                    compressed_size: compressed.len() as i32,
                    reserved2: 0,
                };
                data_offset += compressed.len();
                block
            })
            .collect();

        let header = ArchiveHeader {
            load_priority: self.load_priority,
            compressed_size: chunks.iter().map(|(_, c)| c.len() as i64).sum(),
            decompressed_size: payload.len() as i64,
            record_count: records.len() as i64,
            block_count: blocks.len() as i32,
            max_block_size: self.max_block_size as i32,
        };

        let mut out = Cursor::new(Vec::new());
        out.write_le(&ARCHIVE_MAGIC).unwrap();
        out.write_le(&header).unwrap();
        for record in &records {
            out.write_le(record).unwrap();
        }
        for block in &blocks {
            out.write_le(block).unwrap();
        }
        for (_, compressed) in &chunks {
            out.write_all(compressed).unwrap();
        }
        out.into_inner()
    }

    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }

    fn compress(&self, chunk: &[u8]) -> Vec<u8> {
        match self.codec {
            Codec::Stored => chunk.to_vec(),
            Codec::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(chunk).unwrap();
                encoder.finish().unwrap()
            }
            Codec::Lz4 => panic!("fixtures only write stored or zlib blocks"),
        }
    }
}

/// Encode a stream index listing `paths` with distinct checksums
pub fn stream_index_bytes(paths: &[&str]) -> Vec<u8> {
    let mut data = STREAM_INDEX_MAGIC.to_le_bytes().to_vec();
    data.extend_from_slice(&(paths.len() as i32).to_le_bytes());
    for (i, path) in paths.iter().enumerate() {
        data.extend_from_slice(&(path.len() as i32).to_le_bytes());
        data.extend_from_slice(path.as_bytes());
        data.extend_from_slice(&[i as u8; 16]);
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
    }
    data
}

pub fn write_stream_index(dir: &Path, name: &str, paths: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, stream_index_bytes(paths)).unwrap();
    path
}

/// Deterministic, poorly compressible test data
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    let mut state = u32::from(seed).wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}
