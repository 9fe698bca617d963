//! Standard item lists offered on each service-area page.

/// Items suggested for a service-area page, or an empty slice for unknown titles.
pub fn standard_items(page_title: &str) -> &'static [&'static str] {
    match page_title {
        "Household" => &[
            "Bedding",
            "Towels",
            "Cooking Utensils",
            "Pots and Pans",
            "Plates and Bowls",
            "Cups and Mugs",
            "Cutlery",
            "Storage Containers",
            "Laundry Detergent",
            "Dish Soap",
            "Cleaning Supplies",
            "Trash Bags",
            "Brooms and Mops",
            "Buckets",
            "Candles",
            "Flashlights",
            "Batteries",
            "Matches and Lighters",
        ],
        "Hygiene" => &[
            "Soap",
            "Shampoo",
            "Conditioner",
            "Toothpaste",
            "Toothbrushes",
            "Mouthwash",
            "Dental Floss",
            "Deodorant",
            "Sanitary Pads",
            "Tampons",
            "Wet Wipes",
            "Hand Sanitizer",
            "Razor Blades",
            "Shaving Cream",
            "Hair Brushes and Combs",
            "Nail Clippers",
            "Cotton Swabs",
            "Face Wash",
            "Body Lotion",
            "Sunscreen",
        ],
        "Food" => &[
            "Rice",
            "Pasta",
            "Flour",
            "Sugar",
            "Salt",
            "Canned Vegetables",
            "Canned Beans",
            "Canned Fish",
            "Canned Meat",
            "Dried Lentils",
            "Dried Beans",
            "Cooking Oil",
            "Instant Noodles",
            "Spices and Seasonings",
            "Peanut Butter",
            "Powdered Milk",
            "Tea",
            "Coffee",
            "Honey",
            "Protein Bars",
            "Dried Fruits",
            "Nuts and Seeds",
            "Bottled Water",
        ],
        "Infrastructure" => &[
            "Tarps",
            "Rope",
            "Duct Tape",
            "Plastic Sheeting",
            "Wood Planks",
            "Cement",
            "Bricks",
            "Shovels",
            "Hammers",
            "Nails and Screws",
            "Wrenches",
            "Screwdrivers",
            "Hand Saws",
            "Wheelbarrows",
            "Water Purification Tablets",
            "Solar Panels",
            "Power Banks",
            "Generators",
            "Extension Cords",
            "Folding Chairs",
            "Portable Tables",
        ],
        "Infants and Children" => &[
            "Diapers",
            "Baby Wipes",
            "Infant Formula",
            "Baby Bottles",
            "Pacifiers",
            "Teething Toys",
            "Baby Clothes",
            "Swaddle Blankets",
            "Crib Sheets",
            "Strollers",
            "Car Seats",
            "High Chairs",
            "Children's Books",
            "Toys",
            "Stuffed Animals",
            "Coloring Books and Crayons",
            "Baby Shampoo",
            "Baby Lotion",
            "Nasal Aspirators",
            "Thermometers",
        ],
        "Shelter" => &[
            "Tents",
            "Sleeping Bags",
            "Blankets",
            "Foam Mats",
            "Pillows",
            "Mosquito Nets",
            "Emergency Mylar Blankets",
            "Portable Stoves",
            "Firewood",
            "Charcoal",
            "Heaters",
            "Portable Fans",
            "Collapsible Water Containers",
            "Tarpaulins",
            "Tent Poles",
            "Windbreakers",
            "Ground Covers",
            "Flashlights",
            "Lanterns",
            "Whistles",
            "Emergency Radios",
        ],
        "Clothing" => &[
            "Pants",
            "Jeans",
            "Leggings",
            "Sweatpants",
            "Shorts",
            "T-Shirts",
            "Long-Sleeve Shirts",
            "Sweaters",
            "Hoodies",
            "Jackets",
            "Coats",
            "Scarves",
            "Gloves",
            "Hats",
            "Socks",
            "Underwear",
            "Bras",
            "Thermal Wear",
            "Raincoats",
            "Boots",
            "Sneakers",
            "Sandals",
            "Flip-Flops",
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pages_have_items() {
        assert!(standard_items("Clothing").contains(&"Socks"));
        assert!(standard_items("Shelter").contains(&"Tents"));
        assert!(standard_items("Demographics").is_empty());
    }
}
