/// Column names describing one side of an enabling/dependent component pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ComponentColumns {
    pub label: &'static str,
    pub component: &'static str,
    pub url: &'static str,
    pub url_status: &'static str,
    pub source: &'static str,
    pub description: &'static str,
    pub id: &'static str,
}

pub(crate) const ENABLING: ComponentColumns = ComponentColumns {
    label: "enabling",
    component: "Enabling Component",
    url: "Enabling Component URL",
    url_status: "Enabling URL Status",
    source: "Enabling Source",
    description: "Enabling Component Description",
    id: "Enabling Component ID",
};

pub(crate) const DEPENDENT: ComponentColumns = ComponentColumns {
    label: "dependent",
    component: "Dependent Component",
    url: "Dependent Component URL",
    url_status: "Dependent URL Status",
    source: "Dependent Source",
    description: "Dependent Component Description",
    id: "Dependent Component ID",
};

pub(crate) const SIDES: [ComponentColumns; 2] = [ENABLING, DEPENDENT];
