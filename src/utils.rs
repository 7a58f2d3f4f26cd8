use candle_core::{Device, Result, Tensor};

use crate::graph::NodeSet;

pub fn mask_to_index(mask: &Tensor) -> Result<Tensor> {
    Tensor::from_iter(
        mask.to_vec1()?
            .into_iter()
            .enumerate()
            .filter_map(|(idx, m): (_, u8)| if m == 0 { None } else { Some(idx as u32) }),
        mask.device(),
    )
}

pub fn set_to_index(ids: &NodeSet, device: &Device) -> Result<Tensor> {
    Tensor::from_iter(ids.iter().copied(), device)
}

pub fn index_to_set(index: &Tensor) -> Result<NodeSet> {
    Ok(index.to_vec1::<u32>()?.into_iter().collect())
}

/// Rows of `xs` at `ids`; an empty selection keeps the trailing dimensions.
pub fn select_rows(xs: &Tensor, ids: &NodeSet) -> Result<Tensor> {
    if ids.is_empty() {
        let mut dims = xs.dims().to_vec();
        dims[0] = 0;
        return Tensor::zeros(dims, xs.dtype(), xs.device());
    }
    xs.index_select(&set_to_index(ids, xs.device())?, 0)
}
