pub mod chi_squared;
pub mod descriptor;
pub mod extractor;
pub mod frame;
pub mod histogram;
pub mod index;
pub mod pixel;
pub mod searcher;
