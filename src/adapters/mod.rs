// Adapters layer: concrete implementations for external systems (PDF decoding, CSV outputs)

pub mod csv_sink;
pub mod pdf_text;
