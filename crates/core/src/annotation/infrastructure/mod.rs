pub mod font_loader;
pub mod imageproc_annotator;
