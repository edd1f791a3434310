use crate::attributes::{AttributeSet, Combination};

/// Cartesian product of an attribute set.
///
/// Starts from one empty combination and, attribute by attribute, extends
/// every partial combination with every value. The first attribute varies
/// slowest and the last one fastest, same as nested loops in insertion order.
/// An empty set yields no combinations. Callers bound the result size with
/// [`AttributeSet::check_size`] first.
pub fn enumerate(attributes: &AttributeSet) -> Vec<Combination> {
    if attributes.is_empty() {
        return Vec::new();
    }

    let mut partials = vec![Combination::new()];

    for attribute in attributes.iter() {
        let mut extended = Vec::with_capacity(partials.len() * attribute.values.len());
        for partial in &partials {
            for value in &attribute.values {
                extended.push(partial.clone().with(attribute.name.clone(), value.clone()));
            }
        }
        partials = extended;
    }

    partials
}
