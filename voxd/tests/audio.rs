use voxd::pipeline::{fade_out, float_to_pcm, pcm_to_float, CLIP_LIMIT};

#[test]
fn pcm_normalizes_to_unit_floats() {
    let floats = pcm_to_float(&[0, 16384, -16384, i16::MIN]);
    assert_eq!(floats, vec![0.0, 0.5, -0.5, -1.0]);
}

#[test]
fn quantization_clips_then_saturates() {
    let bytes = float_to_pcm(&[0.0, 0.5, 3.0, -3.0], CLIP_LIMIT);
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    assert_eq!(samples[0], 0);
    assert_eq!(samples[1], 16383);
    // 3.0 clips to 2.0, and 2.0 * 32767 saturates at the i16 rails
    assert_eq!(samples[2], i16::MAX);
    assert_eq!(samples[3], i16::MIN);
}

#[test]
fn fade_ramps_from_full_gain_to_silence() {
    let mut samples = vec![1.0f32; 5];
    fade_out(&mut samples);
    assert_eq!(samples, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
}

#[test]
fn fade_gain_strictly_decreases() {
    let mut samples = vec![1.0f32; 2048];
    fade_out(&mut samples);
    assert_eq!(samples[0], 1.0);
    assert_eq!(*samples.last().unwrap(), 0.0);
    assert!(samples.windows(2).all(|w| w[1] < w[0]));
}

#[test]
fn tiny_buffers_survive_the_fade() {
    let mut one = vec![0.8f32];
    fade_out(&mut one);
    assert_eq!(one, vec![0.8]);

    let mut empty: Vec<f32> = vec![];
    fade_out(&mut empty);
    assert!(empty.is_empty());
}
