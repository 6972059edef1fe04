//! Element classification and per-device capability tables.
//!
//! A device's elements form a tree (collections contain controls). The
//! classifier walks it once at match time, keeps the controls it understands and
//! drops the rest. Element cookies identify a control uniquely within a device,
//! so a control reachable through several collections is only counted once.

use super::usage::*;
use crate::device::AxisInfo;
use crate::event::hid_code;
use std::collections::HashSet;

/// An owned snapshot of an `IOHIDElement` and its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HidElement {
    pub cookie: u32,
    pub kind: ElementType,
    pub usage_page: u32,
    pub usage: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    pub children: Vec<HidElement>,
}

impl HidElement {
    pub fn new(cookie: u32, kind: ElementType, usage_page: u32, usage: u32) -> Self {
        Self {
            cookie,
            kind,
            usage_page,
            usage,
            logical_min: 0,
            logical_max: 0,
            children: Vec::new(),
        }
    }

    pub fn with_range(mut self, min: i32, max: i32) -> Self {
        self.logical_min = min;
        self.logical_max = max;
        self
    }

    pub fn with_children(mut self, children: Vec<HidElement>) -> Self {
        self.children = children;
        self
    }

    pub fn code(&self) -> u32 {
        hid_code(self.usage_page, self.usage)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Axis,
    Button,
    Hat,
}

/// Classify a leaf element. Unsupported usages yield `None`.
pub fn classify(kind: ElementType, page: u32, usage: u32) -> Option<Control> {
    match kind {
        ElementType::Misc | ElementType::Axis => match (page, usage) {
            (PAGE_GENERIC_DESKTOP, GD_HATSWITCH | GD_COUNTED_BUFFER) => Some(Control::Hat),
            (PAGE_GENERIC_DESKTOP, GD_X..=GD_WHEEL) => Some(Control::Axis),
            (PAGE_SIMULATION, SIM_RUDDER | SIM_THROTTLE | SIM_ACCELERATOR | SIM_BRAKE) => {
                Some(Control::Axis)
            }
            _ => None,
        },
        ElementType::Button => match (page, usage) {
            (PAGE_BUTTON | PAGE_CONSUMER, _) => Some(Control::Button),
            (
                PAGE_GENERIC_DESKTOP,
                GD_DPAD_UP..=GD_DPAD_LEFT | GD_START | GD_SELECT | GD_SYSTEM_MAIN_MENU,
            ) => Some(Control::Button),
            _ => None,
        },
        _ => None,
    }
}

/// Ordered axis and button codes of one device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilityTable {
    /// Direct axes by usage, then two synthetic axes per hat.
    pub axes: Vec<(u32, AxisInfo)>,
    pub buttons: Vec<u32>,
}

impl CapabilityTable {
    pub fn build(elements: &[HidElement]) -> Self {
        let mut seen = HashSet::new();
        let mut axes = Vec::new();
        let mut hats = Vec::new();
        let mut buttons = Vec::new();
        collect(elements, &mut seen, &mut axes, &mut hats, &mut buttons);

        axes.sort_by_key(|e: &&HidElement| e.usage);
        hats.sort_by_key(|e: &&HidElement| e.usage);
        buttons.sort_by_key(|e: &&HidElement| e.usage);

        let mut table = CapabilityTable {
            axes: axes
                .iter()
                .map(|e| {
                    (
                        e.code(),
                        AxisInfo {
                            min: e.logical_min,
                            max: e.logical_max,
                        },
                    )
                })
                .collect(),
            buttons: buttons.iter().map(|e| e.code()).collect(),
        };
        let hat_range = AxisInfo { min: -1, max: 1 };
        for hat in hats {
            table.axes.push((hid_code(hat.usage_page, hat.usage), hat_range));
            table.axes.push((hid_code(hat.usage_page, hat.usage + 1), hat_range));
        }
        table
    }

    pub fn axis_codes(&self) -> Vec<u32> {
        self.axes.iter().map(|&(code, _)| code).collect()
    }

    pub fn axis_info(&self, code: u32) -> Option<AxisInfo> {
        self.axes
            .iter()
            .find(|&&(c, _)| c == code)
            .map(|&(_, info)| info)
    }
}

fn collect<'a>(
    elements: &'a [HidElement],
    seen: &mut HashSet<u32>,
    axes: &mut Vec<&'a HidElement>,
    hats: &mut Vec<&'a HidElement>,
    buttons: &mut Vec<&'a HidElement>,
) {
    for el in elements {
        if el.kind == ElementType::Collection {
            collect(&el.children, seen, axes, hats, buttons);
            continue;
        }
        let Some(control) = classify(el.kind, el.usage_page, el.usage) else {
            continue;
        };
        if !seen.insert(el.cookie) {
            continue;
        }
        match control {
            Control::Axis => axes.push(el),
            Control::Hat => hats.push(el),
            Control::Button => buttons.push(el),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(cookie: u32, usage: u32) -> HidElement {
        HidElement::new(cookie, ElementType::Misc, PAGE_GENERIC_DESKTOP, usage).with_range(0, 255)
    }

    fn button(cookie: u32, usage: u32) -> HidElement {
        HidElement::new(cookie, ElementType::Button, PAGE_BUTTON, usage).with_range(0, 1)
    }

    #[test]
    fn classifies_by_type_page_and_usage() {
        use ElementType::*;
        assert_eq!(classify(Misc, PAGE_GENERIC_DESKTOP, GD_X), Some(Control::Axis));
        assert_eq!(classify(Axis, PAGE_GENERIC_DESKTOP, GD_WHEEL), Some(Control::Axis));
        assert_eq!(classify(Misc, PAGE_SIMULATION, SIM_BRAKE), Some(Control::Axis));
        assert_eq!(classify(Misc, PAGE_GENERIC_DESKTOP, GD_HATSWITCH), Some(Control::Hat));
        assert_eq!(classify(Button, PAGE_BUTTON, 12), Some(Control::Button));
        assert_eq!(classify(Button, PAGE_CONSUMER, 0x223), Some(Control::Button));
        assert_eq!(classify(Button, PAGE_GENERIC_DESKTOP, GD_DPAD_LEFT), Some(Control::Button));
        assert_eq!(classify(Button, PAGE_GENERIC_DESKTOP, GD_START), Some(Control::Button));

        assert_eq!(classify(Button, PAGE_GENERIC_DESKTOP, GD_X), None);
        assert_eq!(classify(Misc, PAGE_BUTTON, 1), None);
        assert_eq!(classify(Output, PAGE_GENERIC_DESKTOP, GD_X), None);
        assert_eq!(classify(Misc, PAGE_SIMULATION, 0xB0), None);
    }

    #[test]
    fn table_orders_by_usage_and_appends_hat_axes() {
        let elements = vec![HidElement::new(1, ElementType::Collection, PAGE_GENERIC_DESKTOP, GD_GAMEPAD)
            .with_children(vec![
                button(10, 2),
                HidElement::new(20, ElementType::Misc, PAGE_GENERIC_DESKTOP, GD_HATSWITCH).with_range(0, 7),
                axis(11, GD_Y),
                axis(12, GD_X),
                button(13, 1),
            ])];
        let table = CapabilityTable::build(&elements);

        assert_eq!(
            table.axis_codes(),
            vec![
                hid_code(PAGE_GENERIC_DESKTOP, GD_X),
                hid_code(PAGE_GENERIC_DESKTOP, GD_Y),
                hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH),
                hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH + 1),
            ]
        );
        assert_eq!(
            table.buttons,
            vec![hid_code(PAGE_BUTTON, 1), hid_code(PAGE_BUTTON, 2)]
        );
        assert_eq!(
            table.axis_info(hid_code(PAGE_GENERIC_DESKTOP, GD_X)),
            Some(AxisInfo { min: 0, max: 255 })
        );
        assert_eq!(
            table.axis_info(hid_code(PAGE_GENERIC_DESKTOP, GD_HATSWITCH + 1)),
            Some(AxisInfo { min: -1, max: 1 })
        );
        assert_eq!(table.axis_info(hid_code(PAGE_GENERIC_DESKTOP, GD_Z)), None);
    }

    #[test]
    fn cookies_are_counted_once() {
        let shared = axis(5, GD_X);
        let elements = vec![
            HidElement::new(1, ElementType::Collection, PAGE_GENERIC_DESKTOP, GD_GAMEPAD)
                .with_children(vec![shared.clone(), button(6, 1)]),
            shared,
            button(6, 1),
        ];
        let table = CapabilityTable::build(&elements);
        assert_eq!(table.axes.len(), 1);
        assert_eq!(table.buttons.len(), 1);
    }
}
