pub mod crypto;
pub mod kube;
pub mod kubeconfig;
pub mod output;
