// Codec module for adapting external representations to the typed model

pub mod json;
