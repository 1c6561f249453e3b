//! Fixed identifiers for deterministic tests.

// Pod names (as found in HOSTNAME)
pub const TEST_POD_NAME: &str = "userservice-7d9f-abcde";
pub const TEST_POD_NAME_SHORT: &str = "userservice-0";
pub const TEST_POD_NAME_NO_HYPHEN: &str = "userservice";
pub const TEST_POD_NAME_LEADING_HYPHEN: &str = "-7d9f-abcde";

// Derived container name for TEST_POD_NAME
pub const TEST_CONTAINER_NAME: &str = "userservice";

// Metadata server values
pub const TEST_PROJECT_ID: &str = "bank-of-anthos-test";
pub const TEST_CLUSTER_NAME: &str = "test-cluster";
pub const TEST_ZONE: &str = "us-central1-b";
pub const TEST_ZONE_PATH: &str = "projects/123456789012/zones/us-central1-b";

// Token subjects
pub const TEST_USERNAME: &str = "testuser";
pub const TEST_ACCOUNT_ID: &str = "1011226111";
pub const TEST_DISPLAY_NAME: &str = "Test User";
