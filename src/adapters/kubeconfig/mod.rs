pub mod kubeconfig_store;
