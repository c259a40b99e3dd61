//! Hand skeleton topology and raster drawing primitives.

use image::{Rgb, RgbImage};

use crate::perception::landmark::HandLandmarkIndex::{self, *};
use crate::perception::landmark::DetectedHand;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const HAND_CONNECTIONS: [(HandLandmarkIndex, HandLandmarkIndex); 21] = [
    // 親指
    (Wrist, ThumbCmc),
    (ThumbCmc, ThumbMcp),
    (ThumbMcp, ThumbIp),
    (ThumbIp, ThumbTip),
    // 人差し指
    (Wrist, IndexMcp),
    (IndexMcp, IndexPip),
    (IndexPip, IndexDip),
    (IndexDip, IndexTip),
    // 中指
    (IndexMcp, MiddleMcp),
    (MiddleMcp, MiddlePip),
    (MiddlePip, MiddleDip),
    (MiddleDip, MiddleTip),
    // 薬指
    (MiddleMcp, RingMcp),
    (RingMcp, RingPip),
    (RingPip, RingDip),
    (RingDip, RingTip),
    // 小指
    (RingMcp, PinkyMcp),
    (Wrist, PinkyMcp),
    (PinkyMcp, PinkyPip),
    (PinkyPip, PinkyDip),
    (PinkyDip, PinkyTip),
];

/// 接続線の色 (RGB)
pub const CONNECTION_COLOR: Rgb<u8> = Rgb([0x00, 0xff, 0x00]); // 緑

/// ランドマーク点の色 (RGB)
pub const LANDMARK_COLOR: Rgb<u8> = Rgb([0xff, 0x00, 0x00]); // 赤

/// Draw one detected hand (connections first, landmark dots on top).
pub fn draw_hand(image: &mut RgbImage, hand: &DetectedHand) {
    let (width, height) = (image.width(), image.height());
    for (from, to) in HAND_CONNECTIONS {
        let (x0, y0) = hand.point(from).to_pixel(width, height);
        let (x1, y1) = hand.point(to).to_pixel(width, height);
        draw_line(image, x0, y0, x1, y1, CONNECTION_COLOR);
    }
    for point in &hand.points {
        let (x, y) = point.to_pixel(width, height);
        draw_dot(image, x, y, LANDMARK_COLOR);
    }
}

/// Bresenham line, clipped to the image bounds.
pub fn draw_line(image: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        put_pixel_clipped(image, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// 3x3 dot, clipped to the image bounds.
pub fn draw_dot(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    for dy in -1..=1 {
        for dx in -1..=1 {
            put_pixel_clipped(image, x + dx, y + dy, color);
        }
    }
}

fn put_pixel_clipped(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}
