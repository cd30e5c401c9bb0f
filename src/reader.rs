//! Readers for the annotation and editing-level files a gene figure is built from.

pub mod gtf;
pub mod levels;
