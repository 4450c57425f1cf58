use serde::Serialize;

use crate::domain::request::{CustomerDetails, CustomerTier};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: &'static str,
    pub company_name: &'static str,
    pub tier: CustomerTier,
    pub arr: f64,
    pub contract_renewal_date: &'static str,
    pub account_health: &'static str,
    pub industry: &'static str,
    pub employees: u32,
    pub contact_person: &'static str,
    pub contact_email: &'static str,
}

impl CustomerRecord {
    /// Customer section of a fresh draft, pre-filled from the account directory.
    pub fn to_details(&self) -> CustomerDetails {
        CustomerDetails {
            company_name: self.company_name.to_string(),
            tier: Some(self.tier),
            arr: self.arr,
            renewal_date: self.contract_renewal_date.to_string(),
            contact_person: self.contact_person.to_string(),
            contact_email: self.contact_email.to_string(),
            account_health: self.account_health.to_string(),
        }
    }
}

pub const CUSTOMERS: &[CustomerRecord] = &[
    CustomerRecord {
        id: "cust-001",
        company_name: "Acme Corp",
        tier: CustomerTier::Enterprise,
        arr: 150_000.0,
        contract_renewal_date: "2025-03-15",
        account_health: "at-risk",
        industry: "Manufacturing",
        employees: 500,
        contact_person: "Sarah Johnson",
        contact_email: "sjohnson@acmecorp.com",
    },
    CustomerRecord {
        id: "cust-002",
        company_name: "TechStart Inc",
        tier: CustomerTier::Startup,
        arr: 12_000.0,
        contract_renewal_date: "2025-08-22",
        account_health: "healthy",
        industry: "Technology",
        employees: 25,
        contact_person: "Mike Chen",
        contact_email: "mchen@techstart.io",
    },
    CustomerRecord {
        id: "cust-003",
        company_name: "Global Solutions Ltd",
        tier: CustomerTier::Enterprise,
        arr: 280_000.0,
        contract_renewal_date: "2025-01-10",
        account_health: "at-risk",
        industry: "Consulting",
        employees: 1200,
        contact_person: "Emma Williams",
        contact_email: "ewilliams@globalsolutions.com",
    },
    CustomerRecord {
        id: "cust-004",
        company_name: "DataFlow Systems",
        tier: CustomerTier::Growth,
        arr: 75_000.0,
        contract_renewal_date: "2025-06-30",
        account_health: "healthy",
        industry: "Data Analytics",
        employees: 150,
        contact_person: "Alex Rodriguez",
        contact_email: "arodriguez@dataflow.com",
    },
    CustomerRecord {
        id: "cust-005",
        company_name: "CloudVista",
        tier: CustomerTier::Growth,
        arr: 95_000.0,
        contract_renewal_date: "2025-04-18",
        account_health: "expanding",
        industry: "SaaS",
        employees: 200,
        contact_person: "Jennifer Lee",
        contact_email: "jlee@cloudvista.com",
    },
    CustomerRecord {
        id: "cust-006",
        company_name: "FinanceHub",
        tier: CustomerTier::Enterprise,
        arr: 220_000.0,
        contract_renewal_date: "2025-02-28",
        account_health: "healthy",
        industry: "Finance",
        employees: 800,
        contact_person: "Robert Taylor",
        contact_email: "rtaylor@financehub.com",
    },
    CustomerRecord {
        id: "cust-007",
        company_name: "HealthTech Pro",
        tier: CustomerTier::Growth,
        arr: 60_000.0,
        contract_renewal_date: "2025-09-15",
        account_health: "expanding",
        industry: "Healthcare",
        employees: 120,
        contact_person: "Dr. Lisa Park",
        contact_email: "lpark@healthtechpro.com",
    },
    CustomerRecord {
        id: "cust-008",
        company_name: "RetailMax",
        tier: CustomerTier::Startup,
        arr: 18_000.0,
        contract_renewal_date: "2025-07-20",
        account_health: "healthy",
        industry: "Retail",
        employees: 45,
        contact_person: "David Brown",
        contact_email: "dbrown@retailmax.com",
    },
];

pub fn customer_by_id(id: &str) -> Option<&'static CustomerRecord> {
    CUSTOMERS.iter().find(|customer| customer.id == id)
}

pub fn customer_by_name(name: &str) -> Option<&'static CustomerRecord> {
    let wanted = name.trim();
    CUSTOMERS.iter().find(|customer| customer.company_name.eq_ignore_ascii_case(wanted))
}

/// Best-effort lookup of an account named anywhere in free text. When several names
/// appear the longest one wins, so "Acme Corp" beats a shorter overlapping name.
pub fn customer_mentioned_in(text: &str) -> Option<&'static CustomerRecord> {
    let haystack = text.to_lowercase();
    CUSTOMERS
        .iter()
        .filter(|customer| haystack.contains(&customer.company_name.to_lowercase()))
        .max_by_key(|customer| customer.company_name.len())
}

pub fn customers_by_tier(tier: CustomerTier) -> impl Iterator<Item = &'static CustomerRecord> {
    CUSTOMERS.iter().filter(move |customer| customer.tier == tier)
}

pub fn at_risk_customers() -> impl Iterator<Item = &'static CustomerRecord> {
    CUSTOMERS.iter().filter(|customer| customer.account_health == "at-risk")
}

pub fn total_arr() -> f64 {
    CUSTOMERS.iter().map(|customer| customer.arr).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_lookups() {
        assert_eq!(CUSTOMERS.len(), 8);
        assert_eq!(customer_by_id("cust-003").map(|c| c.company_name), Some("Global Solutions Ltd"));
        assert_eq!(customer_by_name("  acme corp ").map(|c| c.id), Some("cust-001"));
        assert!(customer_by_name("Initech").is_none());
        assert_eq!(customers_by_tier(CustomerTier::Enterprise).count(), 3);
        assert_eq!(at_risk_customers().count(), 2);
        assert_eq!(total_arr(), 910_000.0);
    }

    #[test]
    fn mentions_are_found_case_insensitively() {
        let found = customer_mentioned_in("Spoke with ACME CORP today about exports");
        assert_eq!(found.map(|c| c.id), Some("cust-001"));
        assert!(customer_mentioned_in("A prospect wants SSO").is_none());
    }

    #[test]
    fn seeding_copies_the_account_profile() {
        let details = customer_by_id("cust-005").map(CustomerRecord::to_details);
        let details = details.expect("CloudVista exists");
        assert_eq!(details.company_name, "CloudVista");
        assert_eq!(details.tier, Some(CustomerTier::Growth));
        assert_eq!(details.arr, 95_000.0);
        assert_eq!(details.account_health, "expanding");
        assert_eq!(details.renewal_date, "2025-04-18");
    }
}
