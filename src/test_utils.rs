#[cfg(test)]
use crate::Tensor;

/// Asserts that two floating point values are approximately equal
///
/// # Arguments
/// * `a` - First value
/// * `b` - Second value
/// * `epsilon` - Maximum allowed difference
#[cfg(test)]
pub fn assert_close(a: f32, b: f32, epsilon: f32) {
    assert!((a - b).abs() <= epsilon, "{} is not within {} of {}", a, epsilon, b);
}

/// Asserts that two tensors are exactly equal in both shape and values
#[cfg(test)]
pub fn assert_tensors_eq(a: &Tensor, b: &Tensor) {
    assert_eq!(a.shape, b.shape);
    for (x, y) in a.data.iter().zip(b.data.iter()) {
        assert_eq!(x, y)
    }
}

/// Feeds `losses` to a fresh scheduler one epoch at a time and collects the
/// rate in force at the start of every epoch, plus the final one
#[cfg(test)]
pub fn epoch_rates(scheduler: &mut crate::Scheduler, losses: &[f32]) -> Vec<f32> {
    let mut rates = vec![scheduler.current_lr()];
    for (epoch, &loss) in losses.iter().enumerate() {
        rates.push(scheduler.on_epoch(epoch, loss).unwrap());
    }
    rates
}
