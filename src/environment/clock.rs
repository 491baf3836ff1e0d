//! Day/night clock: time of day, phase, temperature and photosynthetic efficiency.

use serde::{Deserialize, Serialize};

/// Smallest gap (in hours) enforced between consecutive phase boundaries.
pub const MIN_BOUNDARY_GAP: f64 = 0.25;

/// Hours in one in-sim day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Time-of-day phases. Each is a disjoint range of the clock hour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPhase {
    #[default]
    Night,
    Dawn,
    Morning,
    Noon,
    Afternoon,
    Sunset,
    Dusk,
}

impl DayPhase {
    /// Classify a clock hour against the configured boundaries
    pub fn from_hour(hour: f64, config: &ClockConfig) -> DayPhase {
        if hour < config.dawn_hour || hour >= config.night_hour {
            DayPhase::Night
        } else if hour < config.sunrise_hour {
            DayPhase::Dawn
        } else if hour < config.noon_start_hour {
            DayPhase::Morning
        } else if hour < config.noon_end_hour {
            DayPhase::Noon
        } else if hour < config.sunset_hour {
            DayPhase::Afternoon
        } else if hour < config.dusk_hour {
            DayPhase::Sunset
        } else {
            DayPhase::Dusk
        }
    }

    /// Is the sun below the horizon
    pub fn is_night(&self) -> bool {
        matches!(self, DayPhase::Night)
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            DayPhase::Night => "Night",
            DayPhase::Dawn => "Dawn",
            DayPhase::Morning => "Morning",
            DayPhase::Noon => "Noon",
            DayPhase::Afternoon => "Afternoon",
            DayPhase::Sunset => "Sunset",
            DayPhase::Dusk => "Dusk",
        }
    }
}

/// Breakpoints of the daily temperature curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureCurve {
    /// Overnight floor (°C)
    pub night_floor: f64,
    /// Afternoon peak (°C)
    pub day_peak: f64,
    /// Hour at which warming starts from the floor
    pub min_hour: f64,
    /// Hour of the peak
    pub peak_hour: f64,
    /// Hour at which the floor is reached again
    pub evening_hour: f64,
}

impl Default for TemperatureCurve {
    fn default() -> Self {
        Self {
            night_floor: 12.0,
            day_peak: 28.0,
            min_hour: 5.0,
            peak_hour: 14.0,
            evening_hour: 21.0,
        }
    }
}

impl TemperatureCurve {
    /// Temperature at a clock hour.
    ///
    /// Sine-eased rise from `min_hour` to `peak_hour`, cosine-eased fall until
    /// `evening_hour`, flat at the floor otherwise.
    pub fn at(&self, hour: f64) -> f64 {
        let amplitude = self.day_peak - self.night_floor;

        if hour >= self.min_hour && hour < self.peak_hour {
            let t = ramp_fraction(hour, self.min_hour, self.peak_hour);
            self.night_floor + amplitude * (t * std::f64::consts::FRAC_PI_2).sin()
        } else if hour >= self.peak_hour && hour < self.evening_hour {
            let t = ramp_fraction(hour, self.peak_hour, self.evening_hour);
            self.night_floor + amplitude * 0.5 * (1.0 + (t * std::f64::consts::PI).cos())
        } else {
            self.night_floor
        }
    }
}

/// Clock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Real seconds per in-sim day. Values <= 0 freeze the clock.
    pub cycle_length: f64,
    /// Clock hour at simulation start
    pub start_hour: f64,
    pub dawn_hour: f64,
    pub sunrise_hour: f64,
    pub noon_start_hour: f64,
    pub noon_end_hour: f64,
    pub sunset_hour: f64,
    pub dusk_hour: f64,
    pub night_hour: f64,
    pub temperature: TemperatureCurve,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cycle_length: 600.0,
            start_hour: 6.0,
            dawn_hour: 5.0,
            sunrise_hour: 6.0,
            noon_start_hour: 11.0,
            noon_end_hour: 13.0,
            sunset_hour: 18.0,
            dusk_hour: 19.0,
            night_hour: 20.0,
            temperature: TemperatureCurve::default(),
        }
    }
}

impl ClockConfig {
    /// Correct invalid boundaries instead of rejecting them.
    ///
    /// Boundaries are forced strictly increasing with at least
    /// [`MIN_BOUNDARY_GAP`] between neighbours and kept inside the day.
    pub fn sanitized(&self) -> Self {
        let mut out = self.clone();

        if !out.cycle_length.is_finite() || out.cycle_length <= 0.0 {
            log::warn!(
                "clock.cycle_length = {} is not positive; the clock will not advance",
                self.cycle_length
            );
        }

        let mut hours = [
            out.dawn_hour,
            out.sunrise_hour,
            out.noon_start_hour,
            out.noon_end_hour,
            out.sunset_hour,
            out.dusk_hour,
            out.night_hour,
        ];
        if enforce_increasing(&mut hours) {
            log::warn!(
                "clock phase boundaries {:?} were not increasing; corrected to {:?}",
                [
                    self.dawn_hour,
                    self.sunrise_hour,
                    self.noon_start_hour,
                    self.noon_end_hour,
                    self.sunset_hour,
                    self.dusk_hour,
                    self.night_hour,
                ],
                hours
            );
        }
        [
            out.dawn_hour,
            out.sunrise_hour,
            out.noon_start_hour,
            out.noon_end_hour,
            out.sunset_hour,
            out.dusk_hour,
            out.night_hour,
        ] = hours;

        let curve = &mut out.temperature;
        let mut breakpoints = [curve.min_hour, curve.peak_hour, curve.evening_hour];
        if enforce_increasing(&mut breakpoints) {
            log::warn!(
                "temperature curve hours were not increasing; corrected to {:?}",
                breakpoints
            );
        }
        [curve.min_hour, curve.peak_hour, curve.evening_hour] = breakpoints;
        if curve.day_peak < curve.night_floor {
            log::warn!(
                "temperature day_peak {} below night_floor {}; swapping",
                curve.day_peak,
                curve.night_floor
            );
            std::mem::swap(&mut curve.day_peak, &mut curve.night_floor);
        }

        out.start_hour = out.start_hour.rem_euclid(HOURS_PER_DAY);
        out
    }

    /// Length of the daylight window used by the light-intensity curve
    fn daylight_span(&self) -> (f64, f64) {
        (self.dawn_hour, self.night_hour)
    }
}

/// Force `values` strictly increasing inside `[0, 24]`. Returns true if anything changed.
fn enforce_increasing(values: &mut [f64]) -> bool {
    let mut changed = false;
    for i in 0..values.len() {
        let v = values[i];
        let mut fixed = if v.is_finite() { v.clamp(0.0, HOURS_PER_DAY) } else { 0.0 };
        if i > 0 && fixed < values[i - 1] + MIN_BOUNDARY_GAP {
            fixed = (values[i - 1] + MIN_BOUNDARY_GAP).min(HOURS_PER_DAY);
        }
        if fixed != v {
            changed = true;
        }
        values[i] = fixed;
    }
    changed
}

/// Position of `hour` inside `[start, end)`, in `[0, 1]`. Zero-width spans return 1.
fn ramp_fraction(hour: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span <= 0.0 {
        return 1.0;
    }
    ((hour - start) / span).clamp(0.0, 1.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Photosynthetic efficiency for a phase and hour.
///
/// 0 at night, 0→0.5 across dawn, 0.5→1 across morning, 1 at noon,
/// 1→0.5 across afternoon, 0.3 at sunset, 0.3→0 across dusk.
pub fn photosynthetic_efficiency(phase: DayPhase, hour: f64, config: &ClockConfig) -> f64 {
    match phase {
        DayPhase::Night => 0.0,
        DayPhase::Dawn => lerp(
            0.0,
            0.5,
            ramp_fraction(hour, config.dawn_hour, config.sunrise_hour),
        ),
        DayPhase::Morning => lerp(
            0.5,
            1.0,
            ramp_fraction(hour, config.sunrise_hour, config.noon_start_hour),
        ),
        DayPhase::Noon => 1.0,
        DayPhase::Afternoon => lerp(
            1.0,
            0.5,
            ramp_fraction(hour, config.noon_end_hour, config.sunset_hour),
        ),
        DayPhase::Sunset => 0.3,
        DayPhase::Dusk => lerp(
            0.3,
            0.0,
            ramp_fraction(hour, config.dusk_hour, config.night_hour),
        ),
    }
}

/// Snapshot of the environment handed to every agent during a tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Conditions {
    pub day: u32,
    pub hour: f64,
    pub phase: DayPhase,
    /// Ambient temperature (°C)
    pub temperature: f64,
    /// Photosynthetic efficiency (0.0 - 1.0)
    pub photosynthetic_efficiency: f64,
}

impl Conditions {
    /// Conditions with a fixed temperature and efficiency, independent of the clock
    pub fn fixed(temperature: f64, photosynthetic_efficiency: f64) -> Self {
        Self {
            day: 1,
            hour: 12.0,
            phase: DayPhase::Noon,
            temperature,
            photosynthetic_efficiency,
        }
    }
}

/// Day/night clock. Pure function of elapsed time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentClock {
    config: ClockConfig,
    day: u32,
    /// Fraction of the current day elapsed, in `[0, 1)`
    time01: f64,
}

impl EnvironmentClock {
    pub fn new(config: &ClockConfig) -> Self {
        let config = config.sanitized();
        let time01 = config.start_hour / HOURS_PER_DAY;
        Self {
            config,
            day: 1,
            time01,
        }
    }

    /// Rebuild a clock from persisted day and time fraction
    pub fn restore(config: &ClockConfig, day: u32, time01: f64) -> Self {
        let mut clock = Self::new(config);
        clock.day = day.max(1);
        clock.time01 = if time01.is_finite() {
            time01.rem_euclid(1.0)
        } else {
            0.0
        };
        clock
    }

    /// Advance by `dt` seconds. Returns the number of day wraparounds.
    pub fn update(&mut self, dt: f64) -> u32 {
        if self.config.cycle_length <= 0.0 || !self.config.cycle_length.is_finite() {
            return 0;
        }
        if dt <= 0.0 || !dt.is_finite() {
            return 0;
        }

        self.time01 += dt / self.config.cycle_length;
        let wraps = self.time01.floor();
        if wraps >= 1.0 {
            self.time01 -= wraps;
            let wraps = wraps as u32;
            self.day = self.day.saturating_add(wraps);
            return wraps;
        }
        0
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn time01(&self) -> f64 {
        self.time01
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Clock hour in `[0, 24)`
    pub fn clock_hour(&self) -> f64 {
        self.time01 * HOURS_PER_DAY
    }

    pub fn phase(&self) -> DayPhase {
        DayPhase::from_hour(self.clock_hour(), &self.config)
    }

    /// Ambient temperature (°C) at the current hour
    pub fn temperature(&self) -> f64 {
        self.config.temperature.at(self.clock_hour())
    }

    pub fn photosynthetic_efficiency(&self) -> f64 {
        photosynthetic_efficiency(self.phase(), self.clock_hour(), &self.config)
    }

    /// Display light level (0.0 - 1.0). Not used by the metabolism.
    pub fn light_intensity(&self) -> f64 {
        let (start, end) = self.config.daylight_span();
        let hour = self.clock_hour();
        if hour < start || hour >= end {
            return 0.0;
        }
        (ramp_fraction(hour, start, end) * std::f64::consts::PI).sin()
    }

    /// "HH:MM" string of the clock hour
    pub fn clock_string(&self) -> String {
        let minutes = (self.clock_hour() * 60.0).floor() as u32;
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }

    pub fn conditions(&self) -> Conditions {
        Conditions {
            day: self.day,
            hour: self.clock_hour(),
            phase: self.phase(),
            temperature: self.temperature(),
            photosynthetic_efficiency: self.photosynthetic_efficiency(),
        }
    }
}
