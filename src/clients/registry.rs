//! 后端注册表：按后端类型创建 [`ScoringBackend`]
//!
//! 默认注册 mock / openai / gemini 三种实现，调用方可以用 `register` 覆盖任意一种
//! （例如在测试中换成固定返回的后端）。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{BackendSettings, GeminiBackend, MockBackend, OpenAiBackend, ScoringBackend};
use crate::error::ConfigurationError;
use crate::models::{ProviderConfig, ProviderKind};

/// 后端工厂
pub type BackendFactory = Arc<
    dyn Fn(&ProviderConfig, &BackendSettings) -> Result<Box<dyn ScoringBackend>, ConfigurationError>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub struct BackendRegistry {
    factories: HashMap<ProviderKind, BackendFactory>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ProviderKind::Mock, |config, _| {
            Ok(Box::new(MockBackend::new(config.model.clone())))
        });
        registry.register(ProviderKind::OpenAi, |config, settings| {
            Ok(Box::new(OpenAiBackend::new(config, settings)?))
        });
        registry.register(ProviderKind::Gemini, |config, settings| {
            Ok(Box::new(GeminiBackend::new(config, settings)?))
        });
        registry
    }
}

impl BackendRegistry {
    /// 不含任何后端的注册表
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 注册（或覆盖）某个后端类型的工厂
    pub fn register<F>(&mut self, kind: ProviderKind, factory: F)
    where
        F: Fn(&ProviderConfig, &BackendSettings) -> Result<Box<dyn ScoringBackend>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind, Arc::new(factory));
    }

    /// 按配置创建后端
    ///
    /// 需要 API key 的后端在这里就会检查，保证缺 key 时不会发出任何请求。
    pub fn build(
        &self,
        config: &ProviderConfig,
        settings: &BackendSettings,
    ) -> Result<Box<dyn ScoringBackend>, ConfigurationError> {
        if config.provider.requires_api_key() && !config.has_api_key() {
            return Err(ConfigurationError::MissingApiKey {
                provider: config.provider,
            });
        }

        let factory = self
            .factories
            .get(&config.provider)
            .ok_or(ConfigurationError::UnregisteredProvider {
                provider: config.provider,
            })?;

        debug!("创建评分后端: {} (模型: {})", config.provider, config.model);
        factory(config, settings)
    }
}
