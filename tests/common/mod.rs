#![allow(dead_code)]

pub mod graph;

use std::io::Write;

use image::{DynamicImage, Rgb, RgbImage};
use leafsense::{BackendError, ClassifierEngine, LabelCatalog, ModelBackend, PreprocessedTensor};

/// The 38 PlantVillage classes in model output order.
pub const PLANT_VILLAGE: [&str; 38] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
    "Raspberry___healthy",
    "Soybean___healthy",
    "Squash___Powdery_mildew",
    "Strawberry___Leaf_scorch",
    "Strawberry___healthy",
    "Tomato___Bacterial_spot",
    "Tomato___Early_blight",
    "Tomato___Late_blight",
    "Tomato___Leaf_Mold",
    "Tomato___Septoria_leaf_spot",
    "Tomato___Spider_mites Two-spotted_spider_mite",
    "Tomato___Target_Spot",
    "Tomato___Tomato_Yellow_Leaf_Curl_Virus",
    "Tomato___Tomato_mosaic_virus",
    "Tomato___healthy",
];

/// Writes the 38-class table as `class_index,class` CSV.
pub fn write_label_table() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "class_index,class").unwrap();
    for (i, name) in PLANT_VILLAGE.iter().enumerate() {
        writeln!(file, "{},\"{}\"", i, name).unwrap();
    }
    file.flush().unwrap();
    file
}

pub fn plant_village_catalog() -> LabelCatalog {
    LabelCatalog::from_entries(PLANT_VILLAGE.iter().copied().enumerate()).unwrap()
}

/// Softmax output peaked on a class picked from the mean red value of the
/// input, so different images get different rankings.
pub struct ScriptedBackend {
    pub classes: usize,
}

impl ScriptedBackend {
    pub fn peak_for_red(&self, red: u8) -> usize {
        (red as usize * (self.classes - 1)) / 255
    }
}

impl ModelBackend for ScriptedBackend {
    fn infer(&self, input: &PreprocessedTensor) -> Result<Vec<f32>, BackendError> {
        let view = input.view();
        let pixels = view.len() / 3;
        let red_sum: f32 = view.iter().step_by(3).sum();
        let mean_red = (red_sum / pixels as f32).round() as u8;
        let peak = self.peak_for_red(mean_red) as f32;

        let logits: Vec<f32> = (0..self.classes)
            .map(|i| -(i as f32 - peak).abs())
            .collect();
        let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        Ok(exps.into_iter().map(|e| e / total).collect())
    }

    fn output_len(&self) -> Option<usize> {
        Some(self.classes)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Returns the same scores for every input.
pub struct ConstantBackend(pub Vec<f32>);

impl ModelBackend for ConstantBackend {
    fn infer(&self, _input: &PreprocessedTensor) -> Result<Vec<f32>, BackendError> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "constant"
    }
}

pub fn loaded_engine() -> ClassifierEngine {
    let mut engine = ClassifierEngine::default();
    engine
        .load_with_backend(Box::new(ScriptedBackend { classes: 38 }), plant_village_catalog())
        .unwrap();
    engine
}

pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Pseudo-random pixels that PNG cannot compress much.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    }))
}
