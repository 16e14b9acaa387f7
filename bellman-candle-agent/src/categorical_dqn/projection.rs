use anyhow::Result;
use bellman_core::error::BellmanError;

/// Evenly spaced atoms `z_j = r_min + j * delta_z` on `[r_min, r_max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Support {
    r_min: f32,
    r_max: f32,
    atoms: Vec<f32>,
}

impl Support {
    /// Constructs a support with `num_atoms` atoms.
    ///
    /// Fails with a configuration error if `num_atoms < 2` or `r_min >= r_max`.
    pub fn new(r_min: f32, r_max: f32, num_atoms: usize) -> Result<Self> {
        if num_atoms < 2 {
            return Err(BellmanError::config(format!(
                "num_atoms must be at least 2, got {}",
                num_atoms
            ))
            .into());
        }
        if r_min.is_nan() || r_max.is_nan() || r_min >= r_max {
            return Err(BellmanError::config(format!(
                "r_min must be smaller than r_max, got [{}, {}]",
                r_min, r_max
            ))
            .into());
        }

        let delta_z = (r_max - r_min) / (num_atoms - 1) as f32;
        let atoms = (0..num_atoms)
            .map(|j| r_min + j as f32 * delta_z)
            .collect();
        Ok(Self { r_min, r_max, atoms })
    }

    /// Lower bound.
    pub fn r_min(&self) -> f32 {
        self.r_min
    }

    /// Upper bound.
    pub fn r_max(&self) -> f32 {
        self.r_max
    }

    /// Number of atoms.
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Spacing between neighboring atoms.
    pub fn delta_z(&self) -> f32 {
        (self.r_max - self.r_min) / (self.num_atoms() - 1) as f32
    }

    /// Values of the atoms.
    pub fn atoms(&self) -> &[f32] {
        &self.atoms
    }

    /// Distributes `p` on the two atoms surrounding `value`, after clamping it to
    /// the support.
    fn scatter(&self, m: &mut [f32], value: f32, p: f32) {
        let k_max = (self.num_atoms() - 1) as f32;
        let value = value.clamp(self.r_min, self.r_max);
        let b = ((value - self.r_min) / self.delta_z()).clamp(0.0, k_max);
        let (l, u) = (b.floor(), b.ceil());

        if l == u {
            m[l as usize] += p;
        } else {
            m[l as usize] += p * (u - b);
            m[u as usize] += p * (b - l);
        }
    }
}

/// Projects the distributional Bellman update onto the support.
///
/// For each transition, the mass `next_probs[i][j]` of atom `z_j` moves to
/// `r_i + gamma * z_j`, which is then split between its two nearest atoms in
/// proportion to the distances. Values outside the support are clamped to its
/// bounds. If `dones[i]` is set, the next-state distribution is ignored and the
/// whole mass sits at `r_i`. Each returned row sums to the mass of its input row,
/// so probability distributions stay normalized.
pub fn project_distribution(
    next_probs: &[Vec<f32>],
    rewards: &[f32],
    dones: &[bool],
    gamma: f32,
    support: &Support,
) -> Vec<Vec<f32>> {
    next_probs
        .iter()
        .zip(rewards.iter().zip(dones.iter()))
        .map(|(p, (&r, &done))| {
            let mut m = vec![0f32; support.num_atoms()];
            if done {
                support.scatter(&mut m, r, 1.0);
            } else {
                for (&z, &p) in support.atoms().iter().zip(p.iter()) {
                    support.scatter(&mut m, r + gamma * z, p);
                }
            }
            m
        })
        .collect()
}
