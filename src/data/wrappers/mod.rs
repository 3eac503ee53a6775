/// Memory-mapped companion files in a directory on disk
pub mod mmap;
