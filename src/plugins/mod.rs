pub mod minikube_plugin;

pub use minikube_plugin::MinikubeExtension;
