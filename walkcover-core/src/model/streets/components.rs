//! Street network components - nodes and edges

use geo::Point;

use crate::WalkingTime;

/// Street graph node
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// Source ID of the node (OSM ID for extracted networks)
    pub id: i64,
    /// Node coordinates (lon/lat)
    pub geometry: Point<f64>,
}

/// Street graph edge (street segment)
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Pedestrian crossing time in milliseconds
    pub weight: WalkingTime,
    /// Segment length in meters
    pub length_m: f64,
}

impl StreetEdge {
    pub fn walking_time(&self) -> WalkingTime {
        self.weight
    }
}

/// Crossing time in milliseconds for a segment walked at `speed_m_per_min`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn travel_time(length_m: f64, speed_m_per_min: f64) -> WalkingTime {
    (length_m.max(0.0) / speed_m_per_min * 60_000.0).round() as WalkingTime
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_walking_speed() {
        // 80 m/min: 400 m takes five minutes
        assert_eq!(travel_time(400.0, 80.0), 300_000);
        assert_eq!(travel_time(0.0, 80.0), 0);
        assert_eq!(travel_time(-3.0, 80.0), 0);
    }

    #[test]
    fn short_segments_keep_sub_second_time() {
        // 10 m at 80 m/min is 7.5 s
        assert_eq!(travel_time(10.0, 80.0), 7_500);
        assert_eq!(travel_time(1.0, 80.0), 750);
    }
}
