//! Lookup table of the available analysis modules.

use sarovar_core::models::ModuleId;

use crate::module::{AnalysisModule, ModuleDescriptor};
use crate::modules::{
    EncroachmentModule, FloodModule, RainfallModule, RainwaterHarvestingModule,
    WaterQualityModule,
};

/// Registered modules in selector order.
pub struct ModuleRegistry {
    modules: Vec<Box<dyn AnalysisModule>>,
}

impl ModuleRegistry {
    pub fn empty() -> Self {
        Self { modules: Vec::new() }
    }

    /// The five built-in modules.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(RainfallModule));
        registry.register(Box::new(RainwaterHarvestingModule));
        registry.register(Box::new(EncroachmentModule));
        registry.register(Box::new(FloodModule));
        registry.register(Box::new(WaterQualityModule));
        registry
    }

    /// Add a module, replacing any module registered under the same id.
    pub fn register(&mut self, module: Box<dyn AnalysisModule>) {
        let id = module.descriptor().id;
        match self.modules.iter().position(|m| m.descriptor().id == id) {
            Some(index) => self.modules[index] = module,
            None => self.modules.push(module),
        }
    }

    pub fn get(&self, id: &ModuleId) -> Option<&dyn AnalysisModule> {
        self.modules.iter().find(|m| &m.descriptor().id == id).map(|m| m.as_ref())
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.get(id).is_some()
    }

    pub fn descriptors(&self) -> Vec<ModuleDescriptor> {
        self.modules.iter().map(|m| m.descriptor()).collect()
    }

    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.iter().map(|m| m.descriptor().id).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
