//! End-to-end tests of the tone-mapping pipelines.

use approx::assert_abs_diff_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tonecam_color::{linear_from_srgb, srgb_from_linear, ColorConvert};
use tonecam_core::{ColorSpace, Image};
use tonecam_ops::{
    equalized_xyz_from_lab, render_variants, rgb_to_bw_corrected_lab, EqualizeExt, OpsError,
    ToneMapParams, ToneMapper,
};

/// Synthetic sRGB test card: horizontal ramp, vertical tint, one bright patch.
fn test_card(w: usize, h: usize) -> Image<u8> {
    let mut data = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            let bright = x > w / 2 && y < h / 3;
            let r = if bright { 250 } else { (x * 200 / w) as u8 + 20 };
            let g = (y * 120 / h) as u8 + 40;
            let b = ((x + y) * 90 / (w + h)) as u8 + 30;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    Image::from_vec(ColorSpace::Srgb, w, h, 3, data).unwrap()
}

fn assert_uniform(img: &Image<f32>) {
    let c = img.channels();
    let first = img.as_slice()[..c].to_vec();
    for px in img.as_slice().chunks_exact(c) {
        for (a, b) in px.iter().zip(&first) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_uniform_gray_stays_uniform() {
    for gray in [0.05f32, 0.18, 0.5, 0.9] {
        let mut img = Image::<f32>::new(ColorSpace::Rgb, 4, 4, 3);
        img.fill(gray);

        let mut lightness = rgb_to_bw_corrected_lab(&mut img).unwrap();
        assert_eq!(img.color_space(), ColorSpace::Lab);
        assert_uniform(&img);
        assert!(lightness.iter().all(|&v| v == lightness[0]));

        let xyz = equalized_xyz_from_lab(&img, &mut lightness).unwrap();
        assert_eq!(xyz.color_space(), ColorSpace::Xyz);
        assert_uniform(&xyz);
        assert!(!xyz.has_nan());
    }
}

#[test]
fn test_lightness_is_stretched_to_full_range() {
    let mut img = linear_from_srgb(&test_card(48, 32)).unwrap();
    let lightness = rgb_to_bw_corrected_lab(&mut img).unwrap();
    let (lo, hi) = lightness.min_max_values()[0];
    assert_abs_diff_eq!(lo, 0.0, epsilon = 1e-4);
    assert_abs_diff_eq!(hi, 100.0, epsilon = 1e-4);
    // Written back into the image.
    for (px, &l) in img.as_slice().chunks_exact(3).zip(lightness.iter()) {
        assert_eq!(px[0], l);
    }
}

#[test]
fn test_equalized_lightness_covers_range() {
    let mut img = linear_from_srgb(&test_card(40, 24)).unwrap();
    let mut lightness = rgb_to_bw_corrected_lab(&mut img).unwrap();
    let darkest = lightness
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap();

    let xyz = equalized_xyz_from_lab(&img, &mut lightness).unwrap();
    assert!(xyz.same_dimensions(&img));
    assert!(lightness.iter().all(|&v| (0.0..=100.0).contains(&v)));
    assert_eq!(lightness[darkest], 0.0);

    // Equalizing again is stable on the bucket order.
    let mut again = lightness.clone();
    again.equalize(0.0, 100.0).unwrap();
    assert_eq!(again[darkest], 0.0);
}

#[test]
fn test_variants_encode_back_to_srgb() {
    let card = test_card(36, 20);
    let linear = linear_from_srgb(&card).unwrap();
    let variants = render_variants(&linear).unwrap();
    for img in [
        &variants.exposure_corrected,
        &variants.color_corrected,
        &variants.equalized,
        &variants.equalized_color_corrected,
    ] {
        assert_eq!(img.color_space(), ColorSpace::Rgb);
        assert!(img.same_dimensions(&linear));
        assert!(!img.has_nan());
        assert!(img.iter().all(|&v| (0.0..=1.0).contains(&v)));
        let encoded = srgb_from_linear(img).unwrap();
        assert_eq!(encoded.dimensions(), card.dimensions());
    }
    // The input is untouched.
    assert_eq!(linear.color_space(), ColorSpace::Rgb);
}

#[test]
fn test_black_frame_stays_finite() {
    let mut black = Image::<f32>::new(ColorSpace::Rgb, 8, 8, 3);
    let mut img = black.clone();
    let lightness = rgb_to_bw_corrected_lab(&mut img).unwrap();
    assert!(!lightness.has_nan());
    assert!(!img.has_nan());

    // Top half black, bottom half mid gray.
    for px in black.as_mut_slice().chunks_exact_mut(3).skip(32) {
        px.fill(0.5);
    }
    for src in [Image::<f32>::new(ColorSpace::Rgb, 8, 8, 3), black] {
        let variants = render_variants(&src).unwrap();
        for img in [
            &variants.exposure_corrected,
            &variants.color_corrected,
            &variants.equalized,
            &variants.equalized_color_corrected,
        ] {
            assert!(!img.has_nan());
            assert!(img.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }
}

#[test]
fn test_custom_params_pipeline() {
    let params = ToneMapParams::default()
        .with_downscale_target(8)
        .with_percentiles(0.01, 0.99)
        .with_quantize_levels(256);
    let mapper = ToneMapper::new(params).unwrap();
    let mut img = linear_from_srgb(&test_card(64, 40)).unwrap();
    let lightness = mapper.rgb_to_bw_corrected_lab(&mut img).unwrap();
    assert_eq!(lightness.dimensions(), (64, 40));
    assert!(lightness.iter().all(|v| v.is_finite()));
}

#[test]
fn test_invalid_params_rejected() {
    let params = ToneMapParams::default().with_percentiles(0.5, 1.5);
    assert!(matches!(ToneMapper::new(params), Err(OpsError::InvalidBound(_))));
}

#[test]
fn test_unsupported_transform_surfaces() {
    let mut img = Image::<f32>::new(ColorSpace::Lab, 2, 2, 3);
    let err: OpsError = img.change_color_space(ColorSpace::Lms).unwrap_err().into();
    assert!(err.is_unsupported_transform());
}

#[test]
fn test_wrong_input_space_rejected() {
    let mut img = linear_from_srgb(&test_card(8, 8)).unwrap();
    img.change_color_space(ColorSpace::Xyz).unwrap();
    let err = rgb_to_bw_corrected_lab(&mut img).unwrap_err();
    assert!(err.is_color_space_error());
    assert_eq!(img.color_space(), ColorSpace::Xyz);
}

#[test]
fn test_borrowed_codec_buffer() {
    let released = Arc::new(AtomicUsize::new(0));
    let card = test_card(12, 8);
    let mut pixels = card.as_slice().to_vec().into_boxed_slice();
    let ptr = pixels.as_mut_ptr();
    let counter = Arc::clone(&released);
    {
        // SAFETY: `pixels` outlives the image and is not touched meanwhile.
        let borrowed = unsafe {
            Image::from_raw_parts(
                ColorSpace::Srgb,
                ptr,
                12,
                8,
                3,
                Some(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
        }
        .unwrap();
        assert!(borrowed.is_borrowed());
        let linear = linear_from_srgb(&borrowed).unwrap();
        assert!(!linear.is_borrowed());
        let xyz = linear.converted(ColorSpace::Xyz).unwrap();
        assert_eq!(xyz.dimensions(), (12, 8));
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(&pixels[..], card.as_slice());
}
