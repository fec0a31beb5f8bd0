//! Piecewise stellar event-rate model.

use rand::RngExt;
use rand_chacha::ChaCha8Rng;

/// Event rates for a simple stellar population, per Myr per solar mass.
///
/// Core-collapse events switch on after the most massive stars evolve
/// off the main sequence and off again once the 8-solar-mass stars are
/// gone; the two-segment rate reflects the changing slope of the IMF
/// across that window. A delayed component with a prompt Gaussian burst
/// continues afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateModel {
    /// Age at which core-collapse events begin, Myr.
    pub core_collapse_onset_myr: f64,
    /// Age at which the core-collapse rate steps down, Myr.
    pub core_collapse_break_myr: f64,
    /// Age at which core-collapse events end, Myr.
    pub core_collapse_end_myr: f64,
    /// Rate in the early window, events/Myr/M☉.
    pub early_rate: f64,
    /// Rate in the late window, events/Myr/M☉.
    pub late_rate: f64,
    /// Base delayed rate after the core-collapse window, events/Myr/M☉.
    pub delayed_base_rate: f64,
    /// Amplitude of the prompt delayed burst, events/Myr/M☉.
    pub delayed_prompt_rate: f64,
    /// Center of the prompt burst, Myr.
    pub delayed_prompt_peak_myr: f64,
    /// Width of the prompt burst, Myr.
    pub delayed_prompt_width_myr: f64,
    /// Optional power-law metallicity modulation of the core-collapse
    /// rate, `(Z/Z☉)^exponent`. Zero disables it.
    pub metallicity_exponent: f64,
}

impl Default for RateModel {
    fn default() -> Self {
        Self {
            core_collapse_onset_myr: 3.401,
            core_collapse_break_myr: 10.37,
            core_collapse_end_myr: 37.53,
            early_rate: 5.408e-4,
            late_rate: 2.516e-4,
            delayed_base_rate: 5.3e-8,
            delayed_prompt_rate: 1.6e-5,
            delayed_prompt_peak_myr: 50.0,
            delayed_prompt_width_myr: 10.0,
            metallicity_exponent: 0.0,
        }
    }
}

impl RateModel {
    /// Expected event rate at the given age, in events/Myr/M☉.
    ///
    /// `metallicity_ratio` is the population's total-metal abundance in
    /// solar units; it only enters when `metallicity_exponent` is
    /// nonzero.
    pub fn expected_rate(&self, age_myr: f64, metallicity_ratio: f64) -> f64 {
        if age_myr <= self.core_collapse_onset_myr {
            return 0.0;
        }
        if age_myr <= self.core_collapse_end_myr {
            let base = if age_myr <= self.core_collapse_break_myr {
                self.early_rate
            } else {
                self.late_rate
            };
            if self.metallicity_exponent != 0.0 && metallicity_ratio > 0.0 {
                return base * metallicity_ratio.powf(self.metallicity_exponent);
            }
            return base;
        }
        let offset = (age_myr - self.delayed_prompt_peak_myr) / self.delayed_prompt_width_myr;
        self.delayed_base_rate + self.delayed_prompt_rate * (-0.5 * offset * offset).exp()
    }

    /// Expected number of events for a population of `mass_solar` over
    /// a step of `dt_myr`.
    pub fn expected_events(
        &self,
        age_myr: f64,
        mass_solar: f64,
        dt_myr: f64,
        metallicity_ratio: f64,
    ) -> f64 {
        self.expected_rate(age_myr, metallicity_ratio) * mass_solar * dt_myr
    }
}

/// Draw a Poisson-distributed event count.
///
/// Knuth's product method below λ = 30; above it, a rounded normal
/// approximation via Box-Muller (the same transform the noise tooling
/// uses to avoid a distributions dependency).
pub(crate) fn sample_poisson(rng: &mut ChaCha8Rng, lambda: f64) -> u32 {
    if lambda <= 0.0 {
        return 0;
    }
    if lambda < 30.0 {
        let limit = (-lambda).exp();
        let mut product: f64 = rng.random();
        let mut count = 0u32;
        while product > limit {
            product *= rng.random::<f64>();
            count += 1;
        }
        return count;
    }
    let u1: f64 = rng.random::<f64>().max(1.0e-300);
    let u2: f64 = rng.random();
    let gauss = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    let sample = lambda + lambda.sqrt() * gauss;
    if sample < 0.0 {
        0
    } else {
        sample.round() as u32
    }
}
