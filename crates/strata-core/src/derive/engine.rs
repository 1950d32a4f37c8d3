use crate::{
    model::{Fields, Model, Schema},
    value::Value,
};
use tracing::trace;

/// Produce the derived slots for a new base state.
///
/// Without a predecessor every derived field is computed. Otherwise each
/// field either recomputes (its trigger fired) or carries the predecessor's
/// cached value over unchanged.
pub(crate) fn derive_values(
    schema: &Schema,
    prev: Option<&Model>,
    next: &Fields<'_>,
) -> Box<[Value]> {
    let Some(prev) = prev else {
        return schema
            .derived()
            .iter()
            .map(|field| {
                trace!(
                    schema = %schema.name(),
                    field = %field.name,
                    reason = "initial",
                    "computing derived field"
                );
                field.compute.run(next, None)
            })
            .collect();
    };

    let before = prev.fields();

    schema
        .derived()
        .iter()
        .enumerate()
        .map(|(slot, field)| {
            if field.trigger.fires(&before, next) {
                trace!(
                    schema = %schema.name(),
                    field = %field.name,
                    reason = "changed",
                    "computing derived field"
                );
                field.compute.run(next, Some(prev))
            } else {
                prev.derived_value(slot).clone()
            }
        })
        .collect()
}
