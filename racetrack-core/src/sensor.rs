//! Ray-marched distance sensors.

use crate::constants::{RADAR_ANGLES_DEG, RADAR_BUCKET_WIDTH, RADAR_COUNT, RADAR_MAX_BUCKET};
use crate::track::Track;

/// One ray's terminating point and integer distance from the vehicle center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Radar {
    pub end_x: i64,
    pub end_y: i64,
    pub distance: i32,
}

impl Radar {
    #[inline]
    pub fn bucket(&self) -> u8 {
        distance_bucket(self.distance)
    }
}

/// Quantizes a raw distance into `0..=10` (30 px per level).
#[inline]
pub fn distance_bucket(distance: i32) -> u8 {
    let level = distance.max(0) / RADAR_BUCKET_WIDTH;
    level.min(RADAR_MAX_BUCKET as i32) as u8
}

/// Marches outward one pixel of length at a time from `(cx, cy)` until a
/// boundary pixel is hit or `max_range` is reached.
pub fn cast_ray(
    track: &Track,
    cx: f64,
    cy: f64,
    heading_deg: f64,
    offset_deg: i32,
    max_range: i32,
) -> Radar {
    let radians = (360.0 - (heading_deg + offset_deg as f64)).to_radians();
    let (sin, cos) = radians.sin_cos();

    let sample = |length: i32| {
        let length = length as f64;
        ((cx + cos * length) as i64, (cy + sin * length) as i64)
    };

    let mut length = 0;
    let (mut x, mut y) = sample(length);
    while !track.is_boundary(x, y) && length < max_range {
        length += 1;
        (x, y) = sample(length);
    }

    let dx = x as f64 - cx;
    let dy = y as f64 - cy;
    Radar {
        end_x: x,
        end_y: y,
        distance: (dx * dx + dy * dy).sqrt() as i32,
    }
}

#[derive(Clone, Debug)]
pub struct SensorArray {
    max_range: i32,
    radars: [Radar; RADAR_COUNT],
}

impl SensorArray {
    pub fn new(max_range: i32) -> Self {
        Self {
            max_range,
            radars: [Radar::default(); RADAR_COUNT],
        }
    }

    /// Recomputes every ray from scratch, in [`RADAR_ANGLES_DEG`] order.
    pub fn sense(&mut self, track: &Track, cx: f64, cy: f64, heading_deg: f64) {
        for (radar, offset) in self.radars.iter_mut().zip(RADAR_ANGLES_DEG) {
            *radar = cast_ray(track, cx, cy, heading_deg, offset, self.max_range);
        }
    }

    #[inline]
    pub fn radars(&self) -> &[Radar; RADAR_COUNT] {
        &self.radars
    }

    pub fn readings(&self) -> [u8; RADAR_COUNT] {
        self.radars.map(|radar| radar.bucket())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RADAR_MAX_RANGE;

    fn open_track() -> Track {
        Track::from_fn(1000, 1000, |_, _| false).expect("track")
    }

    #[test]
    fn bucket_is_bounded_and_monotonic() {
        let mut previous = 0u8;
        for distance in 0..=1_000 {
            let bucket = distance_bucket(distance);
            assert!(bucket <= RADAR_MAX_BUCKET, "distance={distance}");
            assert!(bucket >= previous, "distance={distance}");
            if distance >= RADAR_MAX_RANGE {
                assert_eq!(bucket, RADAR_MAX_BUCKET, "distance={distance}");
            }
            previous = bucket;
        }
        assert_eq!(distance_bucket(0), 0);
        assert_eq!(distance_bucket(29), 0);
        assert_eq!(distance_bucket(30), 1);
        assert_eq!(distance_bucket(299), 9);
        assert_eq!(distance_bucket(-5), 0);
        assert_eq!(distance_bucket(i32::MAX), RADAR_MAX_BUCKET);
    }

    #[test]
    fn ray_caps_at_max_range_in_open_space() {
        let radar = cast_ray(&open_track(), 500.0, 500.0, 0.0, 0, RADAR_MAX_RANGE);
        assert_eq!(radar.end_x, 800);
        // sin(360deg) is not exactly zero, truncation may land one row up.
        assert!((499..=500).contains(&radar.end_y), "end_y={}", radar.end_y);
        assert_eq!(radar.distance, 300);
        assert_eq!(radar.bucket(), 10);
    }

    #[test]
    fn ray_stops_on_first_boundary_pixel() {
        let track = Track::from_fn(1000, 1000, |x, _| x == 560).expect("track");
        let radar = cast_ray(&track, 500.0, 500.0, 0.0, 0, RADAR_MAX_RANGE);
        assert_eq!((radar.end_x, radar.end_y), (560, 500));
        assert_eq!(radar.distance, 60);
        assert_eq!(radar.bucket(), 2);
    }

    #[test]
    fn ray_starting_on_boundary_has_zero_length() {
        let track = Track::from_fn(100, 100, |_, _| true).expect("track");
        let radar = cast_ray(&track, 50.0, 50.0, 0.0, 45, RADAR_MAX_RANGE);
        assert_eq!((radar.end_x, radar.end_y), (50, 50));
        assert_eq!(radar.distance, 0);
    }

    #[test]
    fn ray_leaving_canvas_terminates_at_edge() {
        let track = Track::from_fn(100, 100, |_, _| false).expect("track");
        let radar = cast_ray(&track, 50.0, 50.0, 0.0, 0, RADAR_MAX_RANGE);
        assert_eq!(radar.end_x, 100);
        assert!((49..=50).contains(&radar.end_y), "end_y={}", radar.end_y);
        assert_eq!(radar.distance, 50);
    }

    #[test]
    fn offsets_follow_screen_orientation() {
        // +90 relative to heading 0 points up the screen (decreasing y).
        let track = Track::from_fn(1000, 1000, |_, y| y == 400).expect("track");
        let radar = cast_ray(&track, 500.0, 500.0, 0.0, 90, RADAR_MAX_RANGE);
        assert_eq!(radar.end_y, 400);
        assert_eq!(radar.distance, 100);

        let radar = cast_ray(&track, 500.0, 500.0, 0.0, -90, RADAR_MAX_RANGE);
        assert_eq!(radar.end_y, 800);
        assert_eq!(radar.distance, 300);
    }

    #[test]
    fn readings_follow_fixed_angle_order() {
        // Wall 45px to the right of center only.
        let track = Track::from_fn(1000, 1000, |x, _| x >= 545).expect("track");
        let mut sensors = SensorArray::new(RADAR_MAX_RANGE);
        sensors.sense(&track, 500.0, 500.0, 0.0);

        let readings = sensors.readings();
        assert_eq!(readings.len(), RADAR_COUNT);
        // -90 and +90 run parallel to the wall.
        assert_eq!(readings[0], 10);
        assert_eq!(readings[4], 10);
        assert_eq!(readings[2], 1);
        assert_eq!(readings[1], readings[3]);
        assert!(readings[1] <= 2);
    }
}
