use crate::error::{Error, Result};
use crate::graph::{Direction, HeteroGraph, NodeSet, NodeType, WRITES};

/// Authors with a paper in every one of `years`.
///
/// With `threshold > 0` an author additionally needs more than `threshold`
/// `writes` edges. The result only ever shrinks as years are added, and an
/// empty set is a valid answer.
pub fn stable_authors(graph: &HeteroGraph, years: &[i64], threshold: u32) -> Result<NodeSet> {
    if years.is_empty() {
        return Err(Error::Config("the year list is empty".to_owned()));
    }
    let mut authors = graph.nodes(NodeType::Author);

    if threshold > 0 {
        let degrees = graph.out_degrees(WRITES)?;
        authors.retain(|&a| degrees[a as usize] > threshold);
        tracing::debug!(threshold, remaining = authors.len(), "applied degree threshold");
    }

    for &year in years {
        let papers = graph.nodes_with_year(NodeType::Paper, year)?;
        let year_authors = graph.typed_neighbors(&papers, WRITES, Direction::Reverse)?;
        authors.retain(|a| year_authors.contains(a));
        tracing::debug!(
            year,
            papers = papers.len(),
            year_authors = year_authors.len(),
            remaining = authors.len(),
            "intersected year"
        );
    }
    Ok(authors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{Device, Tensor};

    // a0: 2010, 2011 (3 papers); a1: 2010 only; a2: 2010, 2011 (2 papers)
    fn graph() -> Result<HeteroGraph> {
        let mut g = HeteroGraph::new([(NodeType::Author, 3), (NodeType::Paper, 5)], &Device::Cpu)
            .with_edges(WRITES, vec![0, 0, 0, 1, 2, 2], vec![0, 1, 4, 2, 3, 1])?;
        g.set_year(
            NodeType::Paper,
            Tensor::new(&[2010i64, 2011, 2010, 2010, 2011], &Device::Cpu)?,
        )?;
        Ok(g)
    }

    #[test]
    fn intersects_across_years() -> Result<()> {
        let g = graph()?;
        assert_eq!(stable_authors(&g, &[2010], 0)?, NodeSet::from([0, 1, 2]));
        assert_eq!(stable_authors(&g, &[2010, 2011], 0)?, NodeSet::from([0, 2]));
        assert_eq!(stable_authors(&g, &[2011, 2010], 0)?, NodeSet::from([0, 2]));
        Ok(())
    }

    #[test]
    fn threshold_is_strict() -> Result<()> {
        let g = graph()?;
        assert_eq!(stable_authors(&g, &[2010, 2011], 2)?, NodeSet::from([0]));
        assert!(stable_authors(&g, &[2010, 2011], 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn year_without_papers_empties_the_set() -> Result<()> {
        let g = graph()?;
        assert!(stable_authors(&g, &[2010, 2012], 0)?.is_empty());
        Ok(())
    }

    #[test]
    fn empty_year_list_is_rejected() -> Result<()> {
        assert!(matches!(
            stable_authors(&graph()?, &[], 0),
            Err(Error::Config(_))
        ));
        Ok(())
    }
}
