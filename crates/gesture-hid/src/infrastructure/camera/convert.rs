//! Raw pixel layout conversion.

/// Converts packed YUYV 4:2:2 to 8-bit BGR using BT.601 coefficients.
///
/// Each 4-byte group `[Y0, U, Y1, V]` yields two pixels sharing `U` and `V`.
/// Returns `None` when `data` holds fewer than `width * height * 2` bytes.
pub fn yuyv_to_bgr(data: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    let pixels = width as usize * height as usize;
    let needed = pixels * 2;
    if data.len() < needed {
        return None;
    }

    let mut bgr = Vec::with_capacity(pixels * 3);
    for group in data[..needed].chunks_exact(4) {
        let u = f32::from(group[1]) - 128.0;
        let v = f32::from(group[3]) - 128.0;
        for y in [group[0], group[2]] {
            let y = f32::from(y);
            let r = y + 1.402 * v;
            let g = y - 0.344 * u - 0.714 * v;
            let b = y + 1.772 * u;
            bgr.extend([b, g, r].map(|c| c.clamp(0.0, 255.0) as u8));
        }
    }
    Some(bgr)
}
