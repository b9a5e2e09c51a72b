//! Fare arithmetic and the BNB-coins redemption policy shared by every
//! booking vertical.
//!
//! All amounts are whole rupees held in `i64`; one coin redeems for ₹1.
//! Conversion to paise happens only at the payment-gateway boundary.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// At most this percentage of an order's total may be paid with coins.
pub const REDEMPTION_CAP_PERCENT: i64 = 50;

/// The four booking verticals. Structurally identical bookings, but each
/// carries its own add-on fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Hotel,
    Flight,
    Train,
    Bus,
}

impl Vertical {
    pub const ALL: [Vertical; 4] = [
        Vertical::Hotel,
        Vertical::Flight,
        Vertical::Train,
        Vertical::Bus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vertical::Hotel => "hotel",
            Vertical::Flight => "flight",
            Vertical::Train => "train",
            Vertical::Bus => "bus",
        }
    }
}

impl FromStr for Vertical {
    type Err = UnknownVertical;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotel" => Ok(Vertical::Hotel),
            "flight" => Ok(Vertical::Flight),
            "train" => Ok(Vertical::Train),
            "bus" => Ok(Vertical::Bus),
            other => Err(UnknownVertical(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking vertical: {0}")]
pub struct UnknownVertical(pub String);

/// Payment channel selected on the train checkout form; it decides the
/// convenience fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChannel {
    Online,
    Upi,
}

/// Per-vertical fee schedule, expressed as data rather than arithmetic
/// scattered across checkout pages. Fields a vertical does not price are
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Percentage tax applied to the fare subtotal (base + upgrades).
    pub tax_percent: i64,
    /// Flat travel-insurance fee, charged only when opted in.
    pub insurance_fee: i64,
    /// Convenience fee for the "online" payment channel.
    pub convenience_online: i64,
    /// Convenience fee for the "upi" payment channel.
    pub convenience_upi: i64,
}

/// The pricing table. Flights carry a 10% tax on the fare subtotal; trains
/// charge flat insurance and a channel-dependent convenience fee; hotels and
/// buses price the base fare only.
pub fn fee_schedule(vertical: Vertical) -> FeeSchedule {
    match vertical {
        Vertical::Flight => FeeSchedule {
            tax_percent: 10,
            insurance_fee: 0,
            convenience_online: 0,
            convenience_upi: 0,
        },
        Vertical::Train => FeeSchedule {
            tax_percent: 0,
            insurance_fee: 45,
            convenience_online: 15,
            convenience_upi: 10,
        },
        Vertical::Hotel | Vertical::Bus => FeeSchedule {
            tax_percent: 0,
            insurance_fee: 0,
            convenience_online: 0,
            convenience_upi: 0,
        },
    }
}

/// Add-ons selected on a checkout form. Fields that do not apply to the
/// vertical being priced are ignored by its fee schedule.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AddOnSelection {
    /// Seat-upgrade price in rupees (flights).
    #[serde(default, rename = "seatUpgrade")]
    pub seat_upgrade: i64,
    /// Meal price in rupees (flights).
    #[serde(default)]
    pub meal: i64,
    /// Whether travel insurance was opted in (trains).
    #[serde(default)]
    pub insurance: bool,
    /// Payment channel, deciding the convenience fee (trains).
    #[serde(default)]
    pub channel: Option<PaymentChannel>,
}

/// A priced order: the gross total, the coins actually applied after
/// clamping, and the amount left to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    #[serde(rename = "totalAmount")]
    pub total_amount: i64,
    #[serde(rename = "coinsApplied")]
    pub coins_applied: i64,
    #[serde(rename = "amountDue")]
    pub amount_due: i64,
}

/// Maximum coins redeemable against an order: the lesser of the available
/// balance and half the order total, never negative.
pub fn max_redeemable(base_total: i64, balance: i64) -> i64 {
    let cap = base_total.max(0).saturating_mul(REDEMPTION_CAP_PERCENT) / 100;
    cap.min(balance.max(0))
}

/// Gross payable total for a vertical: base fare plus whatever its fee
/// schedule prices out of the selected add-ons. Negative add-on amounts
/// count as zero, so no selection can undercut the base fare, and the
/// additions saturate rather than overflow on absurd inputs.
pub fn compute_total(vertical: Vertical, base_fare: i64, add_ons: &AddOnSelection) -> i64 {
    let fees = fee_schedule(vertical);
    let subtotal = base_fare
        .max(0)
        .saturating_add(add_ons.seat_upgrade.max(0))
        .saturating_add(add_ons.meal.max(0));
    let tax = subtotal.saturating_mul(fees.tax_percent) / 100;
    let insurance = if add_ons.insurance {
        fees.insurance_fee
    } else {
        0
    };
    let convenience = match add_ons.channel {
        Some(PaymentChannel::Online) => fees.convenience_online,
        Some(PaymentChannel::Upi) => fees.convenience_upi,
        None => 0,
    };
    subtotal
        .saturating_add(tax)
        .saturating_add(insurance)
        .saturating_add(convenience)
}

/// Price an order and settle the coin redemption against it. The requested
/// coin amount is clamped to the redemption cap and the live balance, so a
/// quote is always internally consistent no matter what the client sent.
pub fn quote(
    vertical: Vertical,
    base_fare: i64,
    add_ons: &AddOnSelection,
    coins_requested: i64,
    balance: i64,
) -> Quote {
    let total_amount = compute_total(vertical, base_fare, add_ons);
    let coins_applied = coins_requested
        .max(0)
        .min(max_redeemable(total_amount, balance));
    Quote {
        total_amount,
        coins_applied,
        amount_due: total_amount - coins_applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_is_min_of_balance_and_half_total() {
        // balance-bound
        assert_eq!(max_redeemable(800, 100), 100);
        // cap-bound
        assert_eq!(max_redeemable(300, 500), 150);
        assert_eq!(max_redeemable(0, 500), 0);
        assert_eq!(max_redeemable(801, 1000), 400); // floor of 400.5
    }

    #[test]
    fn cap_never_negative() {
        assert_eq!(max_redeemable(-10, 100), 0);
        assert_eq!(max_redeemable(100, -5), 0);
    }

    #[test]
    fn cap_respects_both_bounds() {
        for total in [0i64, 1, 99, 100, 799, 800, 12345] {
            for balance in [0i64, 1, 50, 400, 10_000] {
                let m = max_redeemable(total, balance);
                assert!(m <= balance);
                assert!(m <= total * REDEMPTION_CAP_PERCENT / 100);
            }
        }
    }

    #[test]
    fn hotel_and_bus_have_no_add_on_fees() {
        let none = AddOnSelection::default();
        assert_eq!(compute_total(Vertical::Hotel, 2500, &none), 2500);
        assert_eq!(compute_total(Vertical::Bus, 650, &none), 650);
    }

    #[test]
    fn flight_taxes_the_fare_subtotal() {
        let add_ons = AddOnSelection {
            seat_upgrade: 300,
            meal: 200,
            ..Default::default()
        };
        // (4000 + 300 + 200) * 1.10 = 4950
        assert_eq!(compute_total(Vertical::Flight, 4000, &add_ons), 4950);
    }

    #[test]
    fn train_fees_depend_on_channel_and_insurance() {
        let online = AddOnSelection {
            insurance: true,
            channel: Some(PaymentChannel::Online),
            ..Default::default()
        };
        assert_eq!(compute_total(Vertical::Train, 1200, &online), 1200 + 45 + 15);

        let upi = AddOnSelection {
            insurance: false,
            channel: Some(PaymentChannel::Upi),
            ..Default::default()
        };
        assert_eq!(compute_total(Vertical::Train, 1200, &upi), 1210);
    }

    #[test]
    fn negative_add_ons_cannot_undercut_the_base_fare() {
        let add_ons = AddOnSelection {
            seat_upgrade: -3000,
            meal: -200,
            ..Default::default()
        };
        // Negative amounts count as zero; only the tax on the base remains.
        assert_eq!(compute_total(Vertical::Flight, 4000, &add_ons), 4400);

        let q = quote(Vertical::Flight, 4000, &add_ons, 0, 0);
        assert!(q.total_amount >= 4000);
    }

    #[test]
    fn absurd_add_on_amounts_saturate_instead_of_overflowing() {
        let add_ons = AddOnSelection {
            seat_upgrade: i64::MAX,
            meal: i64::MAX,
            ..Default::default()
        };
        let total = compute_total(Vertical::Flight, i64::MAX, &add_ons);
        assert_eq!(total, i64::MAX);
    }

    #[test]
    fn quote_applies_requested_coins_within_cap() {
        // balance 100, total 800: the full balance is redeemable
        let q = quote(Vertical::Hotel, 800, &AddOnSelection::default(), 100, 100);
        assert_eq!(q.total_amount, 800);
        assert_eq!(q.coins_applied, 100);
        assert_eq!(q.amount_due, 700);
    }

    #[test]
    fn quote_clamps_to_half_the_total() {
        // balance 500, total 300: capped at 150 by the 50% rule
        let q = quote(Vertical::Hotel, 300, &AddOnSelection::default(), 500, 500);
        assert_eq!(q.coins_applied, 150);
        assert_eq!(q.amount_due, 150);
    }

    #[test]
    fn quote_ignores_negative_coin_requests() {
        let q = quote(Vertical::Bus, 400, &AddOnSelection::default(), -20, 100);
        assert_eq!(q.coins_applied, 0);
        assert_eq!(q.amount_due, 400);
    }

    #[test]
    fn amount_due_never_drops_below_half_the_total() {
        for total in [1i64, 2, 99, 100, 301, 800, 9999] {
            for requested in [0i64, 10, 5_000] {
                let q = quote(
                    Vertical::Hotel,
                    total,
                    &AddOnSelection::default(),
                    requested,
                    i64::MAX / 4,
                );
                // ceil(total / 2)
                assert!(q.amount_due >= (q.total_amount + 1) / 2);
                assert_eq!(q.amount_due, q.total_amount - q.coins_applied);
            }
        }
    }

    #[test]
    fn vertical_round_trips_through_strings() {
        for v in Vertical::ALL {
            assert_eq!(v.as_str().parse::<Vertical>().unwrap(), v);
        }
        assert!("cruise".parse::<Vertical>().is_err());
    }
}
