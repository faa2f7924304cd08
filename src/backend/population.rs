//! Source/target placement and kernel-driven connection.

use crate::error::{Result, SpatialError};
use crate::geometry::{Domain, Position};
use crate::kernel::Kernel;
use rand::Rng;

/// One source node, its targets, and the accepted connections
#[derive(Clone, Debug)]
pub struct Population {
    pub source: Position,
    targets: Vec<Position>,
    /// distances[i] is the source distance of targets[i]
    distances: Vec<f64>,
    /// Indices into `targets`, in connection order
    connections: Option<Vec<usize>>,
}

impl Population {
    /// Scatter `n` targets uniformly in `domain` around a fixed source
    pub fn scatter<R: Rng + ?Sized>(
        domain: &Domain,
        source: Position,
        n: usize,
        rng: &mut R,
    ) -> Self {
        let targets: Vec<Position> = (0..n).map(|_| domain.sample(rng)).collect();
        let distances = targets.iter().map(|t| domain.distance(&source, t)).collect();
        Self {
            source,
            targets,
            distances,
            connections: None,
        }
    }

    /// Bernoulli trial per target with the kernel probability at its distance.
    ///
    /// Replaces any previous connection set.
    pub fn connect<R: Rng + ?Sized>(&mut self, kernel: &Kernel, rng: &mut R) -> usize {
        let accepted: Vec<usize> = self
            .distances
            .iter()
            .enumerate()
            .filter(|(_, &d)| rng.gen::<f64>() < kernel.probability(d))
            .map(|(i, _)| i)
            .collect();
        let count = accepted.len();
        self.connections = Some(accepted);
        count
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn positions(&self) -> &[Position] {
        &self.targets
    }

    /// Connected target indices, in connection order
    pub fn connections(&self) -> Result<&[usize]> {
        self.connections.as_deref().ok_or(SpatialError::NotConnected)
    }

    pub fn target_distances(&self) -> Result<Vec<f64>> {
        Ok(self
            .connections()?
            .iter()
            .map(|&i| self.distances[i])
            .collect())
    }

    pub fn target_positions(&self) -> Result<Vec<Position>> {
        Ok(self.connections()?.iter().map(|&i| self.targets[i]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dimensions;
    use crate::kernel::KernelKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn domain() -> Domain {
        Domain::centered(1.0, Dimensions::Two, true).unwrap()
    }

    #[test]
    fn test_scatter_aligns_positions_and_distances() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let domain = domain();
        let pop = Population::scatter(&domain, domain.center(), 500, &mut rng);
        assert_eq!(pop.len(), 500);
        for (p, &d) in pop.positions().iter().zip(pop.distances()) {
            assert_eq!(domain.distance(&pop.source, p), d);
        }
    }

    #[test]
    fn test_queries_before_connect_fail() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pop = Population::scatter(&domain(), Position::default(), 10, &mut rng);
        assert!(matches!(pop.target_distances(), Err(SpatialError::NotConnected)));
        assert!(matches!(pop.target_positions(), Err(SpatialError::NotConnected)));
    }

    #[test]
    fn test_certain_and_impossible_kernels() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut pop = Population::scatter(&domain(), Position::default(), 200, &mut rng);

        let all = Kernel::from_params(KernelKind::Constant, 1.0, None).unwrap();
        assert_eq!(pop.connect(&all, &mut rng), 200);
        assert_eq!(pop.target_distances().unwrap(), pop.distances());

        let none = Kernel::Constant { p: 0.0 };
        assert_eq!(pop.connect(&none, &mut rng), 0);
        assert!(pop.target_positions().unwrap().is_empty());
    }

    #[test]
    fn test_connections_are_ordered_subset() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut pop = Population::scatter(&domain(), Position::default(), 1000, &mut rng);
        let kernel = Kernel::from_params(KernelKind::Gaussian, 1.0, None).unwrap();
        pop.connect(&kernel, &mut rng);
        let conns = pop.connections().unwrap();
        assert!(conns.windows(2).all(|w| w[0] < w[1]));
        for (&i, d) in conns.iter().zip(pop.target_distances().unwrap()) {
            assert_eq!(pop.distances()[i], d);
        }
    }
}
