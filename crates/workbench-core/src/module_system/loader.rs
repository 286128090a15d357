use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::kernel::error::Result;
use crate::module_system::definition::ModuleStateStore;

/// A loaded view or settings implementation.
///
/// Rendering is left to the host. The workbench only needs a name and a
/// textual summary of the instance state the component shows.
pub trait ModuleComponent: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn render_summary(&self, state: &ModuleStateStore) -> String;
}

/// The two components an import produces.
#[derive(Debug, Clone)]
pub struct ModuleComponents {
    pub view: Arc<dyn ModuleComponent>,
    pub settings: Arc<dyn ModuleComponent>,
}

/// Produces a module's components when invoked.
pub type ComponentLoader = Arc<dyn Fn() -> BoxFuture<'static, Result<ModuleComponents>> + Send + Sync>;

/// Resolves the component loader of a module by name.
#[async_trait]
pub trait ModuleLoader: Send + Sync + fmt::Debug {
    /// `None` when nothing can load `module_name`.
    async fn resolve(&self, module_name: &str) -> Option<ComponentLoader>;
}

/// Capability map `name -> async factory`, filled once at startup.
#[derive(Default, Clone)]
pub struct LoaderMap {
    loaders: HashMap<String, ComponentLoader>,
}

impl LoaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F, Fut>(&mut self, module_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ModuleComponents>> + Send + 'static,
    {
        let loader: ComponentLoader = Arc::new(move || factory().boxed());
        self.loaders.insert(module_name.into(), loader);
    }

    pub fn with<F, Fut>(mut self, module_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ModuleComponents>> + Send + 'static,
    {
        self.insert(module_name, factory);
        self
    }

    pub fn contains(&self, module_name: &str) -> bool {
        self.loaders.contains_key(module_name)
    }
}

#[async_trait]
impl ModuleLoader for LoaderMap {
    async fn resolve(&self, module_name: &str) -> Option<ComponentLoader> {
        self.loaders.get(module_name).cloned()
    }
}

impl fmt::Debug for LoaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.loaders.keys().collect();
        names.sort();
        f.debug_struct("LoaderMap").field("modules", &names).finish()
    }
}
