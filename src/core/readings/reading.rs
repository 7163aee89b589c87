use serde::Serialize;

/// Plausible displacement range in millimeters, inclusive on both ends.
pub const MIN_DISPLACEMENT_MM: f64 = 0.0;
pub const MAX_DISPLACEMENT_MM: f64 = 3.0;

/// Euclidean norm of the three axis readings.
pub fn displacement(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

pub fn in_valid_range(displacement: f64) -> bool {
    (MIN_DISPLACEMENT_MM..=MAX_DISPLACEMENT_MM).contains(&displacement)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub frame_id: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub displacement: f64,
}

impl Reading {
    pub fn from_axes(frame_id: u64, [x, y, z]: [f64; 3]) -> Self {
        Self {
            frame_id,
            x,
            y,
            z,
            displacement: displacement(x, y, z),
        }
    }

    pub fn is_valid(&self) -> bool {
        in_valid_range(self.displacement)
    }
}

/// Running count and maximum over accepted readings.
///
/// The maximum starts at a displacement of 0 and only moves on a strict
/// increase, so a run where every reading is exactly 0 keeps `max == None`.
/// Ties keep the earliest reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunTally {
    pub count: u64,
    pub max: Option<Reading>,
}

impl RunTally {
    pub fn observe(self, reading: &Reading) -> Self {
        let best = self.max.map_or(MIN_DISPLACEMENT_MM, |m| m.displacement);
        Self {
            count: self.count + 1,
            max: if reading.displacement > best {
                Some(*reading)
            } else {
                self.max
            },
        }
    }

    pub fn max_displacement(&self) -> f64 {
        self.max.map_or(0.0, |m| m.displacement)
    }
}

impl<'a> FromIterator<&'a Reading> for RunTally {
    fn from_iter<I: IntoIterator<Item = &'a Reading>>(iter: I) -> Self {
        iter.into_iter()
            .fold(RunTally::default(), |tally, r| tally.observe(r))
    }
}
