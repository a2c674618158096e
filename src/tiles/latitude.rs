//! CDB geocell width by latitude band.

/// Band lower edges (absolute, northern hemisphere) and their geocell widths in degrees.
const ZONES: [(f64, u32); 6] = [
    (89.0, 12),
    (80.0, 6),
    (75.0, 4),
    (70.0, 3),
    (50.0, 2),
    (0.0, 1),
];

/// Longitudinal width, in whole degrees, of the geocell whose southern edge is `latitude`.
///
/// Zones are symmetric about the equator; in the south the band is chosen by the
/// cell's northern edge so that cell `-51` (spanning -51..-50) is 2 degrees wide.
pub fn tile_width_at_latitude(latitude: f64) -> u32 {
    let edge = if latitude >= 0.0 {
        latitude
    } else {
        -(latitude + 1.0)
    };
    ZONES
        .iter()
        .find(|(lower, _)| edge >= *lower)
        .map(|(_, width)| *width)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_northern_zones() {
        assert_eq!(tile_width_at_latitude(0.0), 1);
        assert_eq!(tile_width_at_latitude(34.0), 1);
        assert_eq!(tile_width_at_latitude(49.0), 1);
        assert_eq!(tile_width_at_latitude(50.0), 2);
        assert_eq!(tile_width_at_latitude(70.0), 3);
        assert_eq!(tile_width_at_latitude(75.0), 4);
        assert_eq!(tile_width_at_latitude(80.0), 6);
        assert_eq!(tile_width_at_latitude(89.0), 12);
    }

    #[test]
    fn test_southern_zones_mirror_northern() {
        assert_eq!(tile_width_at_latitude(-1.0), 1);
        assert_eq!(tile_width_at_latitude(-50.0), 1);
        assert_eq!(tile_width_at_latitude(-51.0), 2);
        assert_eq!(tile_width_at_latitude(-71.0), 3);
        assert_eq!(tile_width_at_latitude(-90.0), 12);
    }
}
