use serde::Serialize;

use crate::domain::catalog::Package;

/// Package with its derived pricing.
#[derive(Debug, Serialize)]
pub struct PackageView {
    #[serde(flatten)]
    pub package: Package,
    pub list_price_cents: i32,
    pub price_cents: i32,
    pub savings_cents: i32,
    pub duration_minutes: i32,
}

impl From<Package> for PackageView {
    fn from(package: Package) -> Self {
        let list_price_cents = package.list_price_cents();
        let price_cents = package.price_cents();
        Self {
            list_price_cents,
            price_cents,
            savings_cents: (list_price_cents - price_cents).max(0),
            duration_minutes: package.duration_minutes(),
            package,
        }
    }
}
