//! This module defines the unit types used throughout the planner and their conversions.
//!
//! All quantities are stored as `f64` newtypes so that, for example, a price cannot accidentally
//! be added to a quantity of credits.
use float_cmp::{ApproxEq, F64Margin};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, Div, Mul, SubAssign};

macro_rules! unit_struct {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new instance of the unit type from an `f64` value.
            pub fn new(value: f64) -> Self {
                Self(value)
            }

            /// The underlying `f64` value.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the value is neither infinite nor NaN.
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// The smaller of two values.
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// The larger of two values.
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Total ordering of the underlying values, as per [`f64::total_cmp`].
            pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl ApproxEq for $name {
            type Margin = F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                self.0.approx_eq(other.0, margin)
            }
        }
    };
}

macro_rules! impl_dimensionless_ops {
    ($name:ident) => {
        impl Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl Div for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

unit_struct!(
    /// A dimensionless value, e.g. a fraction, a share or a cost multiplier.
    Dimensionless
);

impl Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

unit_struct!(
    /// An amount of money.
    Money
);
unit_struct!(
    /// A quantity of carbon credits (tonnes of CO2 equivalent).
    Quantity
);
unit_struct!(
    /// A price for one unit of carbon credits.
    MoneyPerQuantity
);

impl_dimensionless_ops!(Money);
impl_dimensionless_ops!(Quantity);
impl_dimensionless_ops!(MoneyPerQuantity);

impl_mul!(MoneyPerQuantity, Quantity, Money);
impl_div!(Money, Quantity, MoneyPerQuantity);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_price_times_quantity() {
        let cost = MoneyPerQuantity(12.5) * Quantity(4.0);
        assert_eq!(cost, Money(50.0));
        assert_eq!(Quantity(4.0) * MoneyPerQuantity(12.5), Money(50.0));
    }

    #[test]
    fn test_cost_per_unit() {
        assert_approx_eq!(
            MoneyPerQuantity,
            Money(10.0) / Quantity(4.0),
            MoneyPerQuantity(2.5)
        );
    }

    #[test]
    fn test_ratio_of_same_unit() {
        assert_eq!(Money(3.0) / Money(4.0), Dimensionless(0.75));
    }

    #[test]
    fn test_sum_and_assign() {
        let mut total: Quantity = [Quantity(1.0), Quantity(2.5)].into_iter().sum();
        total += Quantity(0.5);
        total -= Quantity(1.0);
        assert_eq!(total, Quantity(3.0));
    }
}
