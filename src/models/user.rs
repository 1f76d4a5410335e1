//! Lawyer and professional profiles (`users`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{lenient, zero_amount};

/// Travel preferences some profiles carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelPreference {
    #[serde(default)]
    pub chattiness: Option<Value>,
    #[serde(default)]
    pub smoking: Option<Value>,
    #[serde(default)]
    pub music: Option<Value>,
    #[serde(default)]
    pub pets: Option<Value>,
}

/// A lawyer or legal professional profile.
///
/// Every field is written on create and replace; missing values are stored
/// as `null` except the counters, which default to `"0.0"`, and `bio`.
/// Mistyped scalars are coerced where they can be and dropped otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub login_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub profile_pic: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fcm_token: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone_number: Option<String>,
    #[serde(default = "zero_amount", deserialize_with = "lenient::amount")]
    pub wallet_amount: String,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_verify: Option<bool>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub travel_preference: Option<TravelPreference>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default = "zero_amount", deserialize_with = "lenient::amount")]
    pub review_count: String,
    #[serde(default = "zero_amount", deserialize_with = "lenient::amount")]
    pub review_sum: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub bio: String,
    /// `individual` or `law_firm`
    #[serde(default, deserialize_with = "lenient::text")]
    pub user_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub specializations: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub services: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub courts: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub complete_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_address_public: Option<bool>,
    /// Usually a number of years; kept as sent
    #[serde(default)]
    pub years_of_experience: Option<Value>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub languages: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_online: Option<bool>,
}

impl User {
    /// Years of experience when stored as a number
    pub fn experience_years(&self) -> Option<f64> {
        self.years_of_experience.as_ref().and_then(Value::as_f64)
    }

    pub fn specializations(&self) -> &[String] {
        self.specializations.as_deref().unwrap_or_default()
    }

    pub fn courts(&self) -> &[String] {
        self.courts.as_deref().unwrap_or_default()
    }
}

/// Experience ranges offered by the directory filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceBucket {
    UpToOne,
    TwoToFour,
    FiveToSeven,
    EightToTen,
    TenPlus,
}

impl ExperienceBucket {
    /// Parse a bucket label (labels use an en-dash, e.g. `2–4`)
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "0–1" => Some(Self::UpToOne),
            "2–4" => Some(Self::TwoToFour),
            "5–7" => Some(Self::FiveToSeven),
            "8–10" => Some(Self::EightToTen),
            "10+" => Some(Self::TenPlus),
            _ => None,
        }
    }

    pub fn contains(self, years: f64) -> bool {
        match self {
            Self::UpToOne => (0.0..=1.0).contains(&years),
            Self::TwoToFour => (2.0..=4.0).contains(&years),
            Self::FiveToSeven => (5.0..=7.0).contains(&years),
            Self::EightToTen => (8.0..=10.0).contains(&years),
            Self::TenPlus => years >= 10.0,
        }
    }
}

/// Practice-area groupings offered by the directory filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeCategory {
    Family,
    Criminal,
    Civil,
    SupremeCourt,
}

impl PracticeCategory {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Family Matters" => Some(Self::Family),
            "Criminal Matters" => Some(Self::Criminal),
            "Civil Matters" => Some(Self::Civil),
            "Supreme Court Matters" => Some(Self::SupremeCourt),
            _ => None,
        }
    }

    pub fn matches(self, user: &User) -> bool {
        let any_spec = |keys: &[&str]| {
            user.specializations()
                .iter()
                .any(|s| keys.contains(&s.as_str()))
        };
        match self {
            Self::Family => any_spec(&["Family", "Divorce", "Child Custody", "Marriage"]),
            Self::Criminal => any_spec(&["Criminal", "Crime", "FIR", "Bail"]),
            Self::Civil => any_spec(&["Civil", "Property", "Contract", "Recovery"]),
            Self::SupremeCourt => user.courts().iter().any(|c| c == "Supreme Court of India"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_user_defaults() {
        let user: User = serde_json::from_value(json!({"email": "a@b.c"})).unwrap();
        assert_eq!(user.wallet_amount, "0.0");
        assert_eq!(user.review_count, "0.0");
        assert_eq!(user.review_sum, "0.0");
        assert_eq!(user.bio, "");
        assert!(user.city.is_none());

        let out = serde_json::to_value(&user).unwrap();
        assert!(out["city"].is_null());
        assert!(out["travelPreference"].is_null());
        assert_eq!(out["walletAmount"], "0.0");
    }

    #[test]
    fn test_user_loose_scalars() {
        let user: User = serde_json::from_value(json!({
            "email": "a@b.c",
            "bio": null,
            "isActive": "true",
            "isOnline": "maybe",
            "fullName": 7,
            "travelPreference": ["smoking"]
        }))
        .unwrap();
        assert_eq!(user.bio, "");
        assert_eq!(user.is_active, Some(true));
        assert_eq!(user.is_online, None);
        assert_eq!(user.full_name.as_deref(), Some("7"));
        assert!(user.travel_preference.is_none());

        let user: User =
            serde_json::from_value(json!({"travelPreference": {"pets": "no"}})).unwrap();
        assert_eq!(user.travel_preference.unwrap().pets, Some(json!("no")));
    }

    #[test]
    fn test_experience_years_requires_number() {
        let mut user: User = serde_json::from_value(json!({"yearsOfExperience": 6})).unwrap();
        assert_eq!(user.experience_years(), Some(6.0));
        user.years_of_experience = Some(json!("6"));
        assert_eq!(user.experience_years(), None);
    }

    #[test]
    fn test_practice_category_matches() {
        let user: User = serde_json::from_value(json!({
            "specializations": ["Bail"],
            "courts": ["Supreme Court of India"]
        }))
        .unwrap();
        assert!(PracticeCategory::Criminal.matches(&user));
        assert!(PracticeCategory::SupremeCourt.matches(&user));
        assert!(!PracticeCategory::Family.matches(&user));
        assert_eq!(PracticeCategory::parse("Tax Matters"), None);
    }

    #[test]
    fn test_bucket_labels_use_en_dash() {
        assert_eq!(ExperienceBucket::parse("2–4"), Some(ExperienceBucket::TwoToFour));
        assert_eq!(ExperienceBucket::parse("2-4"), None);
    }

    proptest! {
        #[test]
        fn prop_bucket_bounds(years in 0u32..60) {
            let y = years as f64;
            prop_assert_eq!(ExperienceBucket::UpToOne.contains(y), years <= 1);
            prop_assert_eq!(ExperienceBucket::TwoToFour.contains(y), (2..=4).contains(&years));
            prop_assert_eq!(ExperienceBucket::FiveToSeven.contains(y), (5..=7).contains(&years));
            prop_assert_eq!(ExperienceBucket::EightToTen.contains(y), (8..=10).contains(&years));
            prop_assert_eq!(ExperienceBucket::TenPlus.contains(y), years >= 10);
        }
    }
}
