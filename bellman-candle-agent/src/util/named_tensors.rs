use anyhow::{anyhow, Context, Result};
use bellman_core::error::BellmanError;
use candle_core::Tensor;
use candle_nn::VarMap;
use std::collections::HashMap;

/// Deep copy of the parameters of a [`VarMap`], keyed by variable name.
#[derive(Clone, Debug)]
pub struct NamedTensors {
    /// Parameters.
    pub named_tensors: HashMap<String, Tensor>,
}

impl NamedTensors {
    /// Copies the variables of a [`VarMap`].
    ///
    /// The copy does not share storage with the variables.
    pub fn copy_from(vs: &VarMap) -> Result<Self> {
        let data = vs
            .data()
            .lock()
            .map_err(|_| anyhow!("variables of the model are poisoned"))?;
        let named_tensors = data
            .iter()
            .map(|(k, v)| -> Result<(String, Tensor)> {
                Ok((k.clone(), v.as_tensor().detach().copy()?))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        Ok(Self { named_tensors })
    }

    /// Overwrites the variables of a [`VarMap`] with these tensors.
    ///
    /// Both sides must hold the same names and shapes.
    pub fn copy_to(&self, vs: &VarMap) -> Result<()> {
        let data = vs
            .data()
            .lock()
            .map_err(|_| anyhow!("variables of the model are poisoned"))?;
        if data.len() != self.named_tensors.len() {
            return Err(BellmanError::shape_mismatch(
                format!("{} named tensors", data.len()),
                self.named_tensors.len(),
            )
            .into());
        }

        for (name, var) in data.iter() {
            let src = self
                .named_tensors
                .get(name)
                .ok_or_else(|| BellmanError::config(format!("missing parameter {}", name)))?;
            let src = src.to_device(var.device())?;
            var.set(&src)
                .with_context(|| format!("failed to copy parameter {}", name))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::{linear, Module, VarBuilder};

    #[test]
    fn test_named_tensors() -> Result<()> {
        let device = Device::Cpu;
        let x = Tensor::from_slice(&[1f32, 2.0, 3.0], (1, 3), &device)?;

        let vs1 = VarMap::new();
        let model1 = linear(3, 2, VarBuilder::from_varmap(&vs1, DType::F32, &device).pp("l"))?;
        let vs2 = VarMap::new();
        let model2 = linear(3, 2, VarBuilder::from_varmap(&vs2, DType::F32, &device).pp("l"))?;

        let y1 = model1.forward(&x)?.flatten_all()?.to_vec1::<f32>()?;
        let y2 = model2.forward(&x)?.flatten_all()?.to_vec1::<f32>()?;
        assert_ne!(y1, y2);

        let nt = NamedTensors::copy_from(&vs1)?;
        nt.copy_to(&vs2)?;
        let y3 = model2.forward(&x)?.flatten_all()?.to_vec1::<f32>()?;
        assert_eq!(y1, y3);

        // The snapshot does not follow later changes of the source.
        let w = vs1.data().lock().unwrap().get("l.weight").unwrap().clone();
        w.set(&w.as_tensor().zeros_like()?)?;
        assert_ne!(
            nt.named_tensors["l.weight"].flatten_all()?.to_vec1::<f32>()?,
            vec![0f32; 6]
        );
        Ok(())
    }
}
