/// `y = slope · x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitLine {
    pub slope: f64,
    pub intercept: f64,
}

impl FitLine {
    /// Ordinary least squares through `(x, y)`.
    ///
    /// Returns `None` for empty input. When every `x` is the same the slope is
    /// undefined and the line is flat at the mean of `y`.
    ///
    /// ```
    /// use queuenet::experiment::FitLine;
    ///
    /// let line = FitLine::least_squares(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
    /// assert!((line.slope - 2.0).abs() < 1e-12);
    /// assert!((line.at(3.0) - 7.0).abs() < 1e-12);
    /// ```
    pub fn least_squares(x: &[f64], y: &[f64]) -> Option<Self> {
        assert_eq!(x.len(), y.len(), "Arrays must have the same length");
        if x.is_empty() {
            return None;
        }
        let n = x.len() as f64;
        let mean_x = x.iter().sum::<f64>() / n;
        let mean_y = y.iter().sum::<f64>() / n;

        let (mut sxy, mut sxx) = (0.0, 0.0);
        for (&xi, &yi) in x.iter().zip(y) {
            sxy += (xi - mean_x) * (yi - mean_y);
            sxx += (xi - mean_x) * (xi - mean_x);
        }
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noisy_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.1, 3.9, 6.1, 7.9];
        let line = FitLine::least_squares(&x, &y).unwrap();
        assert!((line.slope - 1.96).abs() < 1e-9);
        assert!((line.intercept - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(FitLine::least_squares(&[], &[]), None);
        let flat = FitLine::least_squares(&[2.0, 2.0], &[1.0, 3.0]).unwrap();
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.intercept, 2.0);
    }
}
