//! Skeleton overlay drawing.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::pose::landmarks::{LandmarkSet, SKELETON};

/// Landmarks below this confidence are neither drawn nor connected.
pub const MIN_VISIBILITY: f32 = 0.5;

/// Color and size of one overlay element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingSpec {
    pub color: Rgb<u8>,
    pub thickness: u32,
    pub circle_radius: i32,
}

/// Joint markers on still images: red.
pub const IMAGE_JOINT_SPEC: DrawingSpec = DrawingSpec {
    color: Rgb([255, 0, 0]),
    thickness: 2,
    circle_radius: 2,
};

/// Bones on still images: light grey.
pub const IMAGE_CONNECTION_SPEC: DrawingSpec = DrawingSpec {
    color: Rgb([224, 224, 224]),
    thickness: 2,
    circle_radius: 2,
};

/// Joint markers on video frames: green.
pub const VIDEO_JOINT_SPEC: DrawingSpec = DrawingSpec {
    color: Rgb([0, 255, 0]),
    thickness: 2,
    circle_radius: 2,
};

/// Bones on video frames: blue.
pub const VIDEO_CONNECTION_SPEC: DrawingSpec = DrawingSpec {
    color: Rgb([0, 0, 255]),
    thickness: 2,
    circle_radius: 2,
};

/// Draw the skeleton connections, then the joint markers, onto `image`.
pub fn draw_landmarks(
    image: &mut RgbImage,
    set: &LandmarkSet,
    joint_spec: &DrawingSpec,
    connection_spec: &DrawingSpec,
) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    for (from, to) in SKELETON {
        let (Some(a), Some(b)) = (set.get(from), set.get(to)) else {
            continue;
        };
        if a.confidence < MIN_VISIBILITY || b.confidence < MIN_VISIBILITY {
            continue;
        }
        draw_thick_line(
            image,
            a.to_pixel(width, height),
            b.to_pixel(width, height),
            connection_spec,
        );
    }

    for lm in set.landmarks.iter().filter(|l| l.confidence >= MIN_VISIBILITY) {
        draw_filled_circle_mut(
            image,
            lm.to_pixel(width, height),
            joint_spec.circle_radius,
            joint_spec.color,
        );
    }
}

/// Stamp discs along the segment; the disc diameter is the line thickness.
fn draw_thick_line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), spec: &DrawingSpec) {
    let radius = (spec.thickness / 2) as i32;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = dx.abs().max(dy.abs()).max(1);

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = from.0 + (dx as f32 * t).round() as i32;
        let y = from.1 + (dy as f32 * t).round() as i32;
        if radius == 0 {
            if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
                image.put_pixel(x as u32, y as u32, spec.color);
            }
        } else {
            draw_filled_circle_mut(image, (x, y), radius, spec.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmarks::{Joint, Landmark};

    fn lm(joint: Joint, x: f32, y: f32, confidence: f32) -> Landmark {
        Landmark { joint, x, y, confidence }
    }

    #[test]
    fn draws_joints_and_bones() {
        let mut img = RgbImage::new(100, 100);
        let set = LandmarkSet::from_landmarks(vec![
            lm(Joint::LeftHip, 0.2, 0.5, 0.9),
            lm(Joint::RightHip, 0.8, 0.5, 0.9),
        ]);
        draw_landmarks(&mut img, &set, &VIDEO_JOINT_SPEC, &VIDEO_CONNECTION_SPEC);

        assert_eq!(*img.get_pixel(20, 50), VIDEO_JOINT_SPEC.color);
        assert_eq!(*img.get_pixel(80, 50), VIDEO_JOINT_SPEC.color);
        // Midpoint of the hip bone.
        assert_eq!(*img.get_pixel(50, 50), VIDEO_CONNECTION_SPEC.color);
        // Far from everything.
        assert_eq!(*img.get_pixel(50, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn low_confidence_landmarks_are_skipped() {
        let mut img = RgbImage::new(50, 50);
        let set = LandmarkSet::from_landmarks(vec![
            lm(Joint::LeftHip, 0.2, 0.5, 0.9),
            lm(Joint::RightHip, 0.8, 0.5, 0.1),
        ]);
        draw_landmarks(&mut img, &set, &IMAGE_JOINT_SPEC, &IMAGE_CONNECTION_SPEC);

        assert_eq!(*img.get_pixel(10, 25), IMAGE_JOINT_SPEC.color);
        assert_eq!(*img.get_pixel(40, 25), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(25, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn out_of_frame_points_do_not_panic() {
        let mut img = RgbImage::new(10, 10);
        let set = LandmarkSet::from_landmarks(vec![
            lm(Joint::LeftKnee, -3.0, 5.0, 1.0),
            lm(Joint::LeftAnkle, 4.0, -2.0, 1.0),
        ]);
        draw_landmarks(&mut img, &set, &IMAGE_JOINT_SPEC, &IMAGE_CONNECTION_SPEC);
    }
}
