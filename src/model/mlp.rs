//! Multilayer perceptron regressor.
//!
//! Dense layers `n_features -> hidden... -> 1` with a configurable hidden
//! activation and an identity output. Weights are stored `(fan_in, fan_out)`
//! so a layer computes `h · W + b`.

use crate::backend::{Backend, Scalar, Tensor1D, Tensor2D};
use crate::config::Activation;
use crate::error::{ModelError, Result};
use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Weights and bias of one dense layer.
#[derive(Clone, Debug)]
pub struct DenseParams<B: Backend> {
    /// `(fan_in, fan_out)`
    pub weights: Tensor2D<B>,
    pub bias: Tensor1D<B>,
}

#[derive(Clone, Debug)]
pub struct MlpParams<B: Backend> {
    pub layers: Vec<DenseParams<B>>,
}

impl<B: Backend> MlpParams<B> {
    /// `[n_features, hidden..., n_outputs]`
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.layers.iter().map(|l| l.weights.rows()).collect();
        if let Some(last) = self.layers.last() {
            sizes.push(last.weights.cols());
        }
        sizes
    }

    /// `Σ w²` over all weight matrices (biases excluded).
    pub fn weight_sum_squares(&self) -> f64 {
        self.layers
            .iter()
            .map(|l| l.weights.mul(&l.weights).sum().to_f64())
            .sum()
    }

    fn map_layers(&self, f: impl Fn(&DenseParams<B>) -> DenseParams<B>) -> Self {
        Self {
            layers: self.layers.iter().map(f).collect(),
        }
    }

    fn zip_layers(
        &self,
        other: &Self,
        f: impl Fn(&DenseParams<B>, &DenseParams<B>) -> DenseParams<B>,
    ) -> Self {
        assert_eq!(
            self.layers.len(),
            other.layers.len(),
            "Parameter sets must have the same number of layers"
        );
        Self {
            layers: self
                .layers
                .iter()
                .zip(other.layers.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        }
    }
}

impl<B: Backend> ParamOps<B> for MlpParams<B> {
    fn add(&self, other: &Self) -> Self {
        self.zip_layers(other, |a, b| DenseParams {
            weights: a.weights.add(&b.weights),
            bias: a.bias.add(&b.bias),
        })
    }

    fn scale(&self, scalar: Scalar<B>) -> Self {
        self.map_layers(|l| DenseParams {
            weights: l.weights.scale(&scalar),
            bias: l.bias.scale(&scalar),
        })
    }

    fn mul(&self, other: &Self) -> Self {
        self.zip_layers(other, |a, b| DenseParams {
            weights: a.weights.mul(&b.weights),
            bias: a.bias.mul(&b.bias),
        })
    }

    fn div(&self, other: &Self) -> Self {
        self.zip_layers(other, |a, b| DenseParams {
            weights: a.weights.div(&b.weights),
            bias: a.bias.div(&b.bias),
        })
    }

    fn sqrt(&self) -> Self {
        self.map_layers(|l| DenseParams {
            weights: l.weights.sqrt(),
            bias: l.bias.sqrt(),
        })
    }

    fn add_scalar(&self, scalar: Scalar<B>) -> Self {
        self.map_layers(|l| DenseParams {
            weights: l.weights.add_scalar(&scalar),
            bias: l.bias.add_scalar(&scalar),
        })
    }

    fn zeros_like(&self) -> Self {
        self.map_layers(|l| {
            let (rows, cols) = l.weights.shape();
            DenseParams {
                weights: Tensor2D::zeros(rows, cols),
                bias: Tensor1D::zeros(l.bias.len()),
            }
        })
    }
}

/// Plain-data form of a trained network, used for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableMlpParams {
    pub activation: Activation,
    /// `[n_features, hidden..., 1]`
    pub layer_sizes: Vec<usize>,
    /// Row-major `(fan_in, fan_out)` matrix per layer.
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<Vec<f64>>,
}

impl<B: Backend> TryFrom<&SerializableMlpParams> for MlpParams<B> {
    type Error = ModelError;

    fn try_from(value: &SerializableMlpParams) -> Result<Self> {
        let sizes = &value.layer_sizes;
        let n_layers = sizes.len().saturating_sub(1);
        if n_layers == 0 || sizes.contains(&0) {
            return Err(ModelError::Serialization(format!(
                "invalid layer sizes {:?}",
                sizes
            )));
        }
        if value.weights.len() != n_layers || value.biases.len() != n_layers {
            return Err(ModelError::Serialization(format!(
                "expected {} layers, found {} weight and {} bias blocks",
                n_layers,
                value.weights.len(),
                value.biases.len()
            )));
        }

        let mut layers = Vec::with_capacity(n_layers);
        for (i, (w, b)) in value.weights.iter().zip(value.biases.iter()).enumerate() {
            let (fan_in, fan_out) = (sizes[i], sizes[i + 1]);
            if w.len() != fan_in * fan_out || b.len() != fan_out {
                return Err(ModelError::Serialization(format!(
                    "layer {} expects {}x{} weights and {} biases, found {} and {}",
                    i,
                    fan_in,
                    fan_out,
                    fan_out,
                    w.len(),
                    b.len()
                )));
            }
            layers.push(DenseParams {
                weights: Tensor2D::new(w.clone(), fan_in, fan_out),
                bias: Tensor1D::new(b.clone()),
            });
        }
        Ok(Self { layers })
    }
}

fn activate<B: Backend>(activation: Activation, z: &Tensor2D<B>) -> Tensor2D<B> {
    match activation {
        Activation::Relu => z.relu(),
        Activation::Tanh => z.tanh(),
        Activation::Logistic => z.sigmoid(),
        Activation::Identity => z.clone(),
    }
}

/// Activation derivative expressed through the activation's output `a`.
fn derivative<B: Backend>(activation: Activation, a: &Tensor2D<B>) -> Tensor2D<B> {
    let one = Scalar::<B>::new(1.0);
    let neg_one = Scalar::<B>::new(-1.0);
    match activation {
        Activation::Relu => a.heaviside(),
        // 1 - a²
        Activation::Tanh => a.mul(a).scale(&neg_one).add_scalar(&one),
        // a (1 - a)
        Activation::Logistic => a.mul(&a.scale(&neg_one).add_scalar(&one)),
        Activation::Identity => {
            let (rows, cols) = a.shape();
            Tensor2D::zeros(rows, cols).add_scalar(&one)
        }
    }
}

/// Glorot-uniform layer: `U(-bound, bound)` with
/// `bound = sqrt(factor / (fan_in + fan_out))`, factor 2 for logistic units
/// and 6 otherwise.
fn glorot_layer<B: Backend, R: Rng + ?Sized>(
    rng: &mut R,
    fan_in: usize,
    fan_out: usize,
    activation: Activation,
) -> DenseParams<B> {
    let factor = if activation == Activation::Logistic { 2.0 } else { 6.0 };
    let bound = (factor / (fan_in + fan_out) as f64).sqrt();
    let weights = (0..fan_in * fan_out)
        .map(|_| rng.gen_range(-bound..bound))
        .collect();
    let bias = (0..fan_out).map(|_| rng.gen_range(-bound..bound)).collect();
    DenseParams {
        weights: Tensor2D::new(weights, fan_in, fan_out),
        bias: Tensor1D::new(bias),
    }
}

/// Feed-forward regression network with a single output.
///
/// # Example
/// ```
/// use queuenet::backend::{CpuBackend, Tensor2D};
/// use queuenet::config::Activation;
/// use queuenet::model::{MlpRegressor, TrainableModel, Unfitted};
///
/// let net = MlpRegressor::<CpuBackend, Unfitted>::new(2, &[8, 4], Activation::Relu, 42);
/// assert_eq!(net.layer_sizes(), vec![2, 8, 4, 1]);
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]);
/// assert_eq!(net.forward(&x).len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct MlpRegressor<B: Backend, S> {
    params: MlpParams<B>,
    activation: Activation,
    _state: PhantomData<S>,
}

impl<B: Backend, S> MlpRegressor<B, S> {
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// `[n_features, hidden..., 1]`
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.params.layer_sizes()
    }

    pub fn n_features(&self) -> usize {
        self.params.layers.first().map(|l| l.weights.rows()).unwrap_or(0)
    }

    fn forward_layers(&self, x: &Tensor2D<B>, keep: bool) -> (Tensor1D<B>, Vec<Tensor2D<B>>) {
        let n_layers = self.params.layers.len();
        let mut inputs = Vec::with_capacity(if keep { n_layers } else { 0 });
        let mut h = x.clone();
        for (i, layer) in self.params.layers.iter().enumerate() {
            let z = h.matmul(&layer.weights).add_row_vector(&layer.bias);
            let next = if i + 1 == n_layers {
                z
            } else {
                activate(self.activation, &z)
            };
            if keep {
                inputs.push(h);
            }
            h = next;
        }
        (h.ravel(), inputs)
    }
}

impl<B: Backend> MlpRegressor<B, Unfitted> {
    /// Randomly initialized network. The same `seed` always yields the same
    /// weights.
    pub fn new(n_features: usize, hidden_layers: &[usize], activation: Activation, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sizes: Vec<usize> = std::iter::once(n_features)
            .chain(hidden_layers.iter().copied())
            .chain(std::iter::once(1))
            .collect();
        let layers = sizes
            .windows(2)
            .map(|w| glorot_layer(&mut rng, w[0], w[1], activation))
            .collect();
        Self {
            params: MlpParams { layers },
            activation,
            _state: PhantomData,
        }
    }

    pub fn from_params(params: MlpParams<B>, activation: Activation) -> Self {
        Self {
            params,
            activation,
            _state: PhantomData,
        }
    }
}

impl<B: Backend> MlpRegressor<B, Fitted> {
    pub fn new(params: MlpParams<B>, activation: Activation) -> Self {
        Self {
            params,
            activation,
            _state: PhantomData,
        }
    }

    pub fn params(&self) -> &MlpParams<B> {
        &self.params
    }

    pub fn extract_params(&self) -> SerializableMlpParams {
        SerializableMlpParams {
            activation: self.activation,
            layer_sizes: self.params.layer_sizes(),
            weights: self.params.layers.iter().map(|l| l.weights.to_vec()).collect(),
            biases: self.params.layers.iter().map(|l| l.bias.to_vec()).collect(),
        }
    }

    pub fn from_params(params: &SerializableMlpParams) -> Result<Self> {
        let internal = MlpParams::<B>::try_from(params)?;
        Ok(Self::new(internal, params.activation))
    }
}

impl<B: Backend> InferenceModel<B> for MlpRegressor<B, Fitted> {
    type InputSingle = Tensor1D<B>;
    type OutputSingle = Scalar<B>;
    type InputBatch = Tensor2D<B>;
    type OutputBatch = Tensor1D<B>;

    /// Predicts one sample given as a feature vector.
    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle {
        let row = Tensor2D::new(input.to_vec(), 1, input.len());
        self.predict_batch(&row).sum()
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch {
        self.forward_layers(input, false).0
    }
}

impl<B: Backend> TrainableModel<B> for MlpRegressor<B, Unfitted> {
    type Input = Tensor2D<B>;
    type Prediction = Tensor1D<B>;
    type Params = MlpParams<B>;
    type Gradients = MlpParams<B>;
    /// Input of every layer, first layer first.
    type Activations = Vec<Tensor2D<B>>;
    type Output = MlpRegressor<B, Fitted>;

    fn forward(&self, input: &Self::Input) -> Self::Prediction {
        self.forward_layers(input, false).0
    }

    fn forward_train(&self, input: &Self::Input) -> (Self::Prediction, Self::Activations) {
        self.forward_layers(input, true)
    }

    fn backward(
        &self,
        activations: &Self::Activations,
        grad_output: &Self::Prediction,
    ) -> Self::Gradients {
        assert_eq!(
            activations.len(),
            self.params.layers.len(),
            "Activations must come from forward_train on this model"
        );
        let mut delta = grad_output.to_column();
        let mut grads = Vec::with_capacity(self.params.layers.len());
        for (l, layer) in self.params.layers.iter().enumerate().rev() {
            let a = &activations[l];
            let weights = a.transpose().matmul(&delta);
            let bias = delta.col_sum();
            if l > 0 {
                delta = delta
                    .matmul(&layer.weights.transpose())
                    .mul(&derivative(self.activation, a));
            }
            grads.push(DenseParams { weights, bias });
        }
        grads.reverse();
        MlpParams { layers: grads }
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, new_params: &Self::Params) {
        self.params = new_params.clone();
    }

    fn into_fitted(self) -> Self::Output {
        MlpRegressor::<B, Fitted>::new(self.params, self.activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::loss::{Loss, MSELoss};

    type Net = MlpRegressor<CpuBackend, Unfitted>;

    fn inputs() -> Tensor2D<CpuBackend> {
        Tensor2D::from_rows(&[[0.1, 0.9], [0.4, 0.2], [0.8, 0.5], [0.3, 0.3]])
    }

    #[test]
    fn test_topology_and_init_bounds() {
        let net = Net::new(2, &[5, 3], Activation::Relu, 1);
        assert_eq!(net.layer_sizes(), vec![2, 5, 3, 1]);
        assert_eq!(net.n_features(), 2);

        let bound = (6.0 / 7.0f64).sqrt();
        let first = &net.params().layers[0];
        assert!(first.weights.to_vec().iter().all(|w| w.abs() <= bound));
        assert_eq!(first.bias.len(), 5);
    }

    #[test]
    fn test_init_is_seeded() {
        let a = Net::new(2, &[4], Activation::Tanh, 42).into_fitted().extract_params();
        let b = Net::new(2, &[4], Activation::Tanh, 42).into_fitted().extract_params();
        let c = Net::new(2, &[4], Activation::Tanh, 43).into_fitted().extract_params();
        assert_eq!(a, b);
        assert_ne!(a.weights, c.weights);
    }

    #[test]
    fn test_forward_train_matches_forward() {
        let net = Net::new(2, &[6, 4], Activation::Relu, 7);
        let x = inputs();
        let (pred, acts) = net.forward_train(&x);
        assert_eq!(pred.to_vec(), net.forward(&x).to_vec());
        assert_eq!(acts.len(), 3);
        assert_eq!(acts[0].to_vec(), x.to_vec());
        assert_eq!(acts[1].shape(), (4, 6));
    }

    fn loss_at(net: &Net, x: &Tensor2D<CpuBackend>, y: &Tensor1D<CpuBackend>) -> f64 {
        MSELoss.loss(&net.forward(x), y).to_f64()
    }

    fn check_gradients(activation: Activation) {
        let x = inputs();
        let y = Tensor1D::<CpuBackend>::new(vec![0.3, -0.2, 0.5, 0.1]);
        let net = Net::new(2, &[3, 2], activation, 11);

        let (pred, acts) = net.forward_train(&x);
        let grad_out = MSELoss.grad_wrt_prediction(&pred, &y);
        // MSELoss drops the factor 2, so analytic grads are half the numeric ones.
        let analytic = net.backward(&acts, &grad_out);

        let eps = 1e-6;
        for (l, layer) in net.params().layers.iter().enumerate() {
            let (rows, cols) = layer.weights.shape();
            let w = layer.weights.to_vec();
            let g = analytic.layers[l].weights.to_vec();
            for k in 0..rows * cols {
                let mut plus = net.params().clone();
                let mut wp = w.clone();
                wp[k] += eps;
                plus.layers[l].weights = Tensor2D::new(wp, rows, cols);
                let mut minus = net.params().clone();
                let mut wm = w.clone();
                wm[k] -= eps;
                minus.layers[l].weights = Tensor2D::new(wm, rows, cols);

                let numeric = (loss_at(&Net::from_params(plus, activation), &x, &y)
                    - loss_at(&Net::from_params(minus, activation), &x, &y))
                    / (2.0 * eps);
                assert!(
                    (2.0 * g[k] - numeric).abs() < 1e-6,
                    "layer {} weight {}: analytic {} numeric {}",
                    l,
                    k,
                    2.0 * g[k],
                    numeric
                );
            }

            let b = layer.bias.to_vec();
            let gb = analytic.layers[l].bias.to_vec();
            for k in 0..b.len() {
                let mut plus = net.params().clone();
                let mut bp = b.clone();
                bp[k] += eps;
                plus.layers[l].bias = Tensor1D::new(bp);
                let mut minus = net.params().clone();
                let mut bm = b.clone();
                bm[k] -= eps;
                minus.layers[l].bias = Tensor1D::new(bm);

                let numeric = (loss_at(&Net::from_params(plus, activation), &x, &y)
                    - loss_at(&Net::from_params(minus, activation), &x, &y))
                    / (2.0 * eps);
                assert!((2.0 * gb[k] - numeric).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_backward_matches_finite_differences_tanh() {
        check_gradients(Activation::Tanh);
    }

    #[test]
    fn test_backward_matches_finite_differences_logistic() {
        check_gradients(Activation::Logistic);
    }

    #[test]
    fn test_backward_matches_finite_differences_identity() {
        check_gradients(Activation::Identity);
    }

    #[test]
    fn test_param_ops() {
        let p = Net::new(1, &[2], Activation::Relu, 0).params().clone();
        let zeros = p.zeros_like();
        assert_eq!(zeros.weight_sum_squares(), 0.0);

        let doubled = p.add(&p);
        let scaled = p.scale(Scalar::new(2.0));
        assert_eq!(doubled.layers[0].weights.to_vec(), scaled.layers[0].weights.to_vec());

        let squared = p.mul(&p);
        let back = squared.sqrt();
        for (a, b) in back.layers[1].weights.to_vec().iter().zip(p.layers[1].weights.to_vec()) {
            assert!((a - b.abs()).abs() < 1e-12);
        }

        let ones = zeros.add_scalar(Scalar::new(1.0));
        assert_eq!(p.div(&ones).layers[0].bias.to_vec(), p.layers[0].bias.to_vec());
    }

    #[test]
    fn test_weight_sum_squares_excludes_bias() {
        let params = MlpParams::<CpuBackend> {
            layers: vec![DenseParams {
                weights: Tensor2D::new(vec![1.0, 2.0], 2, 1),
                bias: Tensor1D::new(vec![10.0]),
            }],
        };
        assert_eq!(params.weight_sum_squares(), 5.0);
    }

    #[test]
    fn test_serializable_roundtrip() {
        let fitted = Net::new(2, &[4, 3], Activation::Logistic, 5).into_fitted();
        let repr = fitted.extract_params();
        assert_eq!(repr.layer_sizes, vec![2, 4, 3, 1]);

        let restored = MlpRegressor::<CpuBackend, Fitted>::from_params(&repr).unwrap();
        let x = inputs();
        assert_eq!(
            fitted.predict_batch(&x).to_vec(),
            restored.predict_batch(&x).to_vec()
        );
        assert_eq!(restored.activation(), Activation::Logistic);
    }

    #[test]
    fn test_serializable_rejects_inconsistent_shapes() {
        let mut repr = Net::new(2, &[3], Activation::Relu, 5).into_fitted().extract_params();
        repr.weights[1].pop();
        assert!(matches!(
            MlpRegressor::<CpuBackend, Fitted>::from_params(&repr),
            Err(ModelError::Serialization(_))
        ));

        let empty = SerializableMlpParams {
            activation: Activation::Relu,
            layer_sizes: vec![2],
            weights: vec![],
            biases: vec![],
        };
        assert!(MlpRegressor::<CpuBackend, Fitted>::from_params(&empty).is_err());
    }

    #[test]
    fn test_predict_single_matches_batch() {
        let fitted = Net::new(2, &[4], Activation::Relu, 9).into_fitted();
        let x = inputs();
        let batch = fitted.predict_batch(&x).to_vec();
        let single = fitted.predict(&Tensor1D::new(vec![0.4, 0.2])).to_f64();
        assert!((single - batch[1]).abs() < 1e-12);
    }
}
