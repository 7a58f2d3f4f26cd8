use candle_core::{Result, Tensor};
use itertools::Itertools;

/// Mean of `base` rows per target.
///
/// `pairs` holds `(target, source)` links; duplicates count once. Row `t` of
/// the result is the mean of `base[s]` over the sources linked to `t`, or the
/// zero vector if there are none.
pub fn mean_features(base: &Tensor, num_targets: usize, pairs: &[(u32, u32)]) -> Result<Tensor> {
    let (_, dim) = base.dims2()?;
    let device = base.device();
    let pairs: Vec<(u32, u32)> = pairs.iter().copied().sorted_unstable().dedup().collect();
    let zeros = Tensor::zeros((num_targets, dim), base.dtype(), device)?;
    if num_targets == 0 || pairs.is_empty() {
        return Ok(zeros);
    }

    let mut counts = vec![0f32; num_targets];
    for &(target, _) in &pairs {
        counts[target as usize] += 1.0;
    }
    let targets = Tensor::from_iter(pairs.iter().map(|&(t, _)| t), device)?;
    let sources = Tensor::from_iter(pairs.iter().map(|&(_, s)| s), device)?;
    let sums = zeros.index_add(&targets, &base.index_select(&sources, 0)?, 0)?;
    let counts = Tensor::from_iter(counts.into_iter().map(|c| c.max(1.0)), device)?
        .reshape((num_targets, 1))?
        .to_dtype(base.dtype())?;
    sums.broadcast_div(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn mean_over_unique_sources() -> Result<()> {
        let base = Tensor::new(&[[1f32, 2.], [3., 4.], [10., 10.]], &Device::Cpu)?;
        let pairs = [(0, 0), (0, 1), (0, 1), (2, 2)];
        let out = mean_features(&base, 3, &pairs)?.to_vec2::<f32>()?;
        assert_eq!(out, vec![vec![2., 3.], vec![0., 0.], vec![10., 10.]]);
        Ok(())
    }

    #[test]
    fn no_pairs_gives_zero_rows() -> Result<()> {
        let base = Tensor::new(&[[1f32, 2.]], &Device::Cpu)?;
        let out = mean_features(&base, 2, &[])?;
        assert_eq!(out.to_vec2::<f32>()?, vec![vec![0., 0.], vec![0., 0.]]);
        Ok(())
    }
}
