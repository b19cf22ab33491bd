//! Runs the configured modifiers against a builder.

use crate::{
    builder::QueryBuilder, config::Configuration, errors::ModifierError, params::ParamMap,
};

/// Apply every modifier in [`Configuration::modifiers`], in order.
///
/// The first error stops the run; no partially modified builder is returned.
///
/// ```rust,ignore
/// let params = ParamMap::from_query("status=published&sort=-created_at&limit=20");
/// let builder = query_modifier::apply(&params, SeaQueryBuilder::new("posts"), &config)?;
/// ```
///
/// # Errors
///
/// The first [`ModifierError`] reported by a modifier.
pub fn apply<B: QueryBuilder>(
    params: &ParamMap,
    builder: B,
    config: &Configuration,
) -> Result<B, ModifierError> {
    tracing::debug!(
        model = builder.model_name(),
        params = params.len(),
        modifiers = config.modifiers().len(),
        "Applying query modifiers"
    );

    config
        .modifiers()
        .iter()
        .try_fold(builder, |builder, modifier| {
            tracing::trace!(modifier = modifier.name(), "Running modifier");
            modifier.modify(params, builder, config).inspect_err(|err| {
                tracing::debug!(modifier = modifier.name(), kind = err.kind(), %err, "Modifier failed");
            })
        })
}
