use crate::store::data::*;

use super::DbDocument;

impl DbDocument for Flow {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Trigger {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Run {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for RunStep {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Contact {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Order {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Delivery {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Template {
    fn id(&self) -> &str {
        &self.id
    }
}

impl DbDocument for Workspace {
    fn id(&self) -> &str {
        &self.id
    }
}
