pub mod gigachat;
pub mod ocr_space;
