use image::imageops::{self, FilterType};
use image::DynamicImage;
use ndarray::Array4;

/// Side length of the square model input
pub const INPUT_SIZE: u32 = 224;
/// RGB
pub const CHANNELS: usize = 3;
/// Bicubic resampling to the model input size
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Model input of shape `[1, H, W, 3]`, `f32` in the raw `0..=255` range.
/// Values are never scaled to `0..1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedTensor {
    data: Array4<f32>,
}

impl PreprocessedTensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ndarray::ArrayView4<'_, f32> {
        self.data.view()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }

    /// Row-major NHWC values, for backends that take flat buffers.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }
}

/// Converts any decoded image into the model input tensor at the default
/// 224x224 size.
pub fn preprocess(image: &DynamicImage) -> PreprocessedTensor {
    preprocess_with_size(image, INPUT_SIZE)
}

/// Converts to 3-channel RGB, resizes to exactly `size`x`size` and lays the
/// pixels out as `[1, size, size, 3]` floats without normalization.
pub fn preprocess_with_size(image: &DynamicImage, size: u32) -> PreprocessedTensor {
    let rgb = image.to_rgb8();
    let resized = if rgb.dimensions() == (size, size) {
        rgb
    } else {
        imageops::resize(&rgb, size, size, RESIZE_FILTER)
    };

    let side = size as usize;
    let data = Array4::from_shape_fn((1, side, side, CHANNELS), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32
    });
    PreprocessedTensor { data }
}
