//! Pitch to period conversion
//!
//! A channel sounding `f` Hz steps `2f` times per second, so its period in
//! ticks is `step_rate / f` where the step rate follows from the tick
//! interval (see [`crate::config::step_rate_hz`]).

/// Number of MIDI notes
pub const MIDI_NOTE_COUNT: usize = 128;

/// MIDI note number of A4 (440 Hz)
pub const A4_NOTE: u8 = 69;

/// Equal-temperament note frequencies in millihertz, A4 = 440 Hz
#[rustfmt::skip]
pub const NOTE_MILLIHERTZ: [u32; MIDI_NOTE_COUNT] = [
    8_176, 8_662, 9_177, 9_723, 10_301, 10_913, 11_562, 12_250,
    12_978, 13_750, 14_568, 15_434, 16_352, 17_324, 18_354, 19_445,
    20_602, 21_827, 23_125, 24_500, 25_957, 27_500, 29_135, 30_868,
    32_703, 34_648, 36_708, 38_891, 41_203, 43_654, 46_249, 48_999,
    51_913, 55_000, 58_270, 61_735, 65_406, 69_296, 73_416, 77_782,
    82_407, 87_307, 92_499, 97_999, 103_826, 110_000, 116_541, 123_471,
    130_813, 138_591, 146_832, 155_563, 164_814, 174_614, 184_997, 195_998,
    207_652, 220_000, 233_082, 246_942, 261_626, 277_183, 293_665, 311_127,
    329_628, 349_228, 369_994, 391_995, 415_305, 440_000, 466_164, 493_883,
    523_251, 554_365, 587_330, 622_254, 659_255, 698_456, 739_989, 783_991,
    830_609, 880_000, 932_328, 987_767, 1_046_502, 1_108_731, 1_174_659, 1_244_508,
    1_318_510, 1_396_913, 1_479_978, 1_567_982, 1_661_219, 1_760_000, 1_864_655, 1_975_533,
    2_093_005, 2_217_461, 2_349_318, 2_489_016, 2_637_020, 2_793_826, 2_959_955, 3_135_963,
    3_322_438, 3_520_000, 3_729_310, 3_951_066, 4_186_009, 4_434_922, 4_698_636, 4_978_032,
    5_274_041, 5_587_652, 5_919_911, 6_271_927, 6_644_875, 7_040_000, 7_458_620, 7_902_133,
    8_372_018, 8_869_844, 9_397_273, 9_956_063, 10_548_082, 11_175_303, 11_839_822, 12_543_854,
];

/// Maps MIDI note numbers to periods
///
/// Implemented by whatever owns the tuning. The command interface only
/// needs a period per note.
pub trait NoteTable {
    /// Period in ticks for `note`, or `None` if the note is outside the table
    fn period(&self, note: u8) -> Option<u16>;
}

/// Twelve-tone equal temperament at a fixed step rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EqualTemperament {
    step_rate_hz: u32,
}

impl EqualTemperament {
    /// Tuning for a bank stepping at `step_rate_hz`
    pub const fn new(step_rate_hz: u32) -> Self {
        Self { step_rate_hz }
    }
}

impl NoteTable for EqualTemperament {
    fn period(&self, note: u8) -> Option<u16> {
        let millihertz = *NOTE_MILLIHERTZ.get(usize::from(note))?;
        let scaled = u64::from(self.step_rate_hz) * 1000;
        Some(clamp_period(rounded_div(scaled, u64::from(millihertz))))
    }
}

/// Period in ticks for a frequency in Hz
///
/// 0 Hz is silence (period 0). Any audible frequency yields at least one
/// tick, and very low frequencies saturate at `u16::MAX`.
pub fn period_for_frequency(step_rate_hz: u32, hz: u32) -> u16 {
    if hz == 0 {
        return 0;
    }
    clamp_period(rounded_div(u64::from(step_rate_hz), u64::from(hz)))
}

fn rounded_div(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator / 2) / denominator
}

fn clamp_period(ticks: u64) -> u16 {
    u16::try_from(ticks.max(1)).unwrap_or(u16::MAX)
}
