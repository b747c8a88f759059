use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Customer, Product};
use crate::demand::ProductDemandProfile;
use crate::error::{Error, Result};

/// Validate internal consistency of the catalog inputs.
///
/// This checks:
/// - duplicate product and customer ids
/// - empty units of measure and negative prices
/// - demand profiles referencing unknown products or carrying values outside
///   their domain
pub fn validate_catalog(
    products: &[Product],
    customers: &[Customer],
    profiles: &BTreeMap<u32, ProductDemandProfile>,
) -> Result<()> {
    let mut product_ids = BTreeSet::new();
    for product in products {
        if !product_ids.insert(product.id) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate product id: {}",
                product.id
            )));
        }
        if product.uom.trim().is_empty() {
            return Err(Error::InvalidCatalog(format!(
                "product {} has an empty unit of measure",
                product.id
            )));
        }
        if !product.price.is_finite() || product.price < 0.0 {
            return Err(Error::InvalidCatalog(format!(
                "product {} has an invalid price",
                product.id
            )));
        }
    }

    let mut customer_ids = BTreeSet::new();
    for customer in customers {
        if !customer_ids.insert(customer.id) {
            return Err(Error::InvalidCatalog(format!(
                "duplicate customer id: {}",
                customer.id
            )));
        }
        if customer.segment.trim().is_empty() {
            return Err(Error::InvalidCatalog(format!(
                "customer {} has an empty segment",
                customer.id
            )));
        }
    }

    for (product_id, profile) in profiles {
        if !product_ids.contains(product_id) {
            return Err(Error::InvalidProfile(format!(
                "profile references unknown product {product_id}"
            )));
        }
        validate_profile(*product_id, profile)?;
    }

    Ok(())
}

fn validate_profile(product_id: u32, profile: &ProductDemandProfile) -> Result<()> {
    if !profile.base_rate.is_finite() || profile.base_rate < 0.0 {
        return Err(Error::InvalidProfile(format!(
            "product {product_id}: base_rate must be >= 0"
        )));
    }
    if !profile.dispersion.is_finite() || profile.dispersion <= 0.0 {
        return Err(Error::InvalidProfile(format!(
            "product {product_id}: dispersion must be > 0"
        )));
    }
    if profile
        .multipliers()
        .iter()
        .any(|value| !value.is_finite() || *value < 0.0)
    {
        return Err(Error::InvalidProfile(format!(
            "product {product_id}: multipliers must be >= 0"
        )));
    }
    if !profile.promo_strength.is_finite() || !profile.latent_amp.is_finite() {
        return Err(Error::InvalidProfile(format!(
            "product {product_id}: promo_strength and latent_amp must be finite"
        )));
    }
    Ok(())
}
