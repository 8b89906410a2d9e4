//! PID regulator for a single joint, with output clamping.

use std::time::Instant;

/// Proportional-integral-derivative regulator. The regulator keeps the previous error,
/// the accumulated integral and the time of the last call, so the time step is derived
/// from the clock rather than passed by the caller.
#[derive(Debug, Clone)]
pub struct JointPid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    /// (min, max) bounds of the output
    pub output_limits: (f64, f64),

    previous_error: f64,
    integral: f64,
    last_time: Instant,
}

impl JointPid {
    pub fn new(kp: f64, ki: f64, kd: f64, output_limits: (f64, f64)) -> Self {
        JointPid {
            kp,
            ki,
            kd,
            output_limits,
            previous_error: 0.0,
            integral: 0.0,
            last_time: Instant::now(),
        }
    }

    /// Regulator with unbounded output.
    pub fn unbounded(kp: f64, ki: f64, kd: f64) -> Self {
        Self::new(kp, ki, kd, (f64::NEG_INFINITY, f64::INFINITY))
    }

    /// Regulator used for every joint of the cell arm.
    pub fn joint_default() -> Self {
        Self::new(1.0, 0.1, 0.05, (-1.0, 1.0))
    }

    /// Compute the control output using the current time.
    pub fn compute(&mut self, setpoint: f64, measured: f64) -> f64 {
        self.compute_at(setpoint, measured, Instant::now())
    }

    /// Compute the control output as if called at `now`. If no time has passed since
    /// the previous call, 0 is returned and the state is left untouched.
    pub fn compute_at(&mut self, setpoint: f64, measured: f64, now: Instant) -> f64 {
        let dt = now
            .checked_duration_since(self.last_time)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        if dt <= 0.0 {
            return 0.0;
        }

        let error = setpoint - measured;
        self.integral += error * dt;
        let derivative = (error - self.previous_error) / dt;

        let output = self.kp * error + self.ki * self.integral + self.kd * derivative;

        self.previous_error = error;
        self.last_time = now;

        output.clamp(self.output_limits.0, self.output_limits.1)
    }

    pub fn reset(&mut self) {
        self.previous_error = 0.0;
        self.integral = 0.0;
        self.last_time = Instant::now();
    }

    /// Error seen on the last successful call.
    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Clock reference the next time step is measured from.
    pub fn last_time(&self) -> Instant {
        self.last_time
    }
}
