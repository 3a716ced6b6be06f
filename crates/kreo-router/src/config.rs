//! Router configuration.

/// Thresholds and budgets of the orchestration policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Turns longer than this (trimmed chars) may consult the model router.
    pub router_min_chars: usize,
    /// Characters of the turn shown to the model router.
    pub router_probe_chars: usize,
    /// Turns longer than this fall back to a knowledge lookup.
    pub knowledge_min_chars: usize,
    /// Search queries of this length or shorter are not sent.
    pub min_query_chars: usize,
    /// Other chats summarized in the recent-context block.
    pub recent_context_limit: usize,
    /// Characters per token used to size the system prompt.
    pub chars_per_token: usize,
    /// Share of the context window the system prompt may use.
    pub prompt_share: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            router_min_chars: 15,
            router_probe_chars: 300,
            knowledge_min_chars: 5,
            min_query_chars: 2,
            recent_context_limit: 5,
            chars_per_token: 4,
            prompt_share: 0.5,
        }
    }
}

impl RouterConfig {
    /// Create a builder for configuration.
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }

    /// Character budget of the system prompt for a context window of
    /// `num_ctx` tokens.
    pub fn prompt_budget(&self, num_ctx: u32) -> usize {
        let chars = num_ctx as usize * self.chars_per_token;
        (chars as f32 * self.prompt_share) as usize
    }
}

/// Builder for router configuration.
#[derive(Debug, Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    pub fn router_min_chars(mut self, chars: usize) -> Self {
        self.config.router_min_chars = chars;
        self
    }

    pub fn router_probe_chars(mut self, chars: usize) -> Self {
        self.config.router_probe_chars = chars;
        self
    }

    pub fn knowledge_min_chars(mut self, chars: usize) -> Self {
        self.config.knowledge_min_chars = chars;
        self
    }

    pub fn min_query_chars(mut self, chars: usize) -> Self {
        self.config.min_query_chars = chars;
        self
    }

    pub fn recent_context_limit(mut self, limit: usize) -> Self {
        self.config.recent_context_limit = limit;
        self
    }

    pub fn chars_per_token(mut self, chars: usize) -> Self {
        self.config.chars_per_token = chars;
        self
    }

    pub fn prompt_share(mut self, share: f32) -> Self {
        self.config.prompt_share = share.clamp(0.0, 1.0);
        self
    }

    pub fn build(self) -> RouterConfig {
        self.config
    }
}
