//! Demo catalog seeding for local development.

use domain::storage::{CatalogStore, Result};
use domain::{Category, NewProduct, Product, ProductImage, Size};

use common::Money;

fn image(url: &str, alt: &str) -> ProductImage {
    ProductImage {
        url: url.to_string(),
        alt_text: Some(alt.to_string()),
    }
}

fn demo_products() -> Vec<NewProduct> {
    vec![
        NewProduct {
            name: "Linen Oversized Shirt".to_string(),
            description: "Breathable 100% linen shirt with a relaxed oversized fit. \
                          Classic collar, earth-tone palette."
                .to_string(),
            price: Money::from_cents(2499),
            category: Category::Men,
            sub_category: Some("Shirts".to_string()),
            sizes: vec![Size::S, Size::M, Size::L, Size::XL, Size::XXL],
            stock_quantity: 80,
            images: vec![image(
                "https://images.unsplash.com/photo-1596755094514-f87e34085b2c?w=600&q=80",
                "Linen Oversized Shirt Front",
            )],
            is_featured: true,
            discount: 0,
        },
        NewProduct {
            name: "Essential Crew Neck Tee".to_string(),
            description: "The perfect everyday t-shirt. 220gsm combed cotton that holds \
                          its shape wash after wash."
                .to_string(),
            price: Money::from_cents(999),
            category: Category::Men,
            sub_category: Some("T-Shirts".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L, Size::XL, Size::XXL],
            stock_quantity: 200,
            images: vec![image(
                "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=600&q=80",
                "Essential Crew Neck Tee",
            )],
            is_featured: true,
            discount: 0,
        },
        NewProduct {
            name: "Raw Hem Denim Jacket".to_string(),
            description: "A modern take on the classic denim jacket with raw hem detailing \
                          and a boxy silhouette."
                .to_string(),
            price: Money::from_cents(4999),
            category: Category::Men,
            sub_category: Some("Jackets".to_string()),
            sizes: vec![Size::S, Size::M, Size::L, Size::XL, Size::XXL],
            stock_quantity: 45,
            images: vec![image(
                "https://images.unsplash.com/photo-1551537482-f2075a1d41f2?w=600&q=80",
                "Raw Hem Denim Jacket",
            )],
            is_featured: true,
            discount: 15,
        },
        NewProduct {
            name: "Flowy Maxi Dress".to_string(),
            description: "Effortlessly elegant maxi dress in lightweight georgette with a \
                          wrap-style bodice and tiered skirt."
                .to_string(),
            price: Money::from_cents(3999),
            category: Category::Women,
            sub_category: Some("Dresses".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L, Size::XL],
            stock_quantity: 50,
            images: vec![image(
                "https://images.unsplash.com/photo-1515372039744-b8f02a3ae446?w=600&q=80",
                "Flowy Maxi Dress",
            )],
            is_featured: true,
            discount: 0,
        },
        NewProduct {
            name: "Structured Blazer".to_string(),
            description: "Premium wool-blend blazer with a single-button closure and clean \
                          lapels. Boardroom to weekend."
                .to_string(),
            price: Money::from_cents(5499),
            category: Category::Women,
            sub_category: Some("Blazers".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L],
            stock_quantity: 35,
            images: vec![image(
                "https://images.unsplash.com/photo-1487222477894-8943e31ef7b2?w=600&q=80",
                "Structured Blazer",
            )],
            is_featured: true,
            discount: 0,
        },
        NewProduct {
            name: "High-Rise Wide Leg Jeans".to_string(),
            description: "Vintage-inspired high-rise jeans in selvedge denim with just \
                          enough stretch for all-day comfort."
                .to_string(),
            price: Money::from_cents(4299),
            category: Category::Women,
            sub_category: Some("Jeans".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L, Size::XL],
            stock_quantity: 65,
            images: vec![image(
                "https://images.unsplash.com/photo-1541099649105-f69ad21f3246?w=600&q=80",
                "High-Rise Wide Leg Jeans",
            )],
            is_featured: false,
            discount: 10,
        },
        NewProduct {
            name: "Striped Cotton Playsuit".to_string(),
            description: "Cheerful striped playsuit in soft organic cotton with snap \
                          buttons for easy dressing."
                .to_string(),
            price: Money::from_cents(1299),
            category: Category::Kids,
            sub_category: Some("Playsuits".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L],
            stock_quantity: 100,
            images: vec![image(
                "https://images.unsplash.com/photo-1622290291468-a28f7a7dc6a8?w=600&q=80",
                "Striped Cotton Playsuit",
            )],
            is_featured: true,
            discount: 0,
        },
        NewProduct {
            name: "Fleece Hoodie".to_string(),
            description: "Super-soft fleece hoodie with a kangaroo pocket and adjustable \
                          drawstring. Machine washable."
                .to_string(),
            price: Money::from_cents(1599),
            category: Category::Kids,
            sub_category: Some("Sweatshirts".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L],
            stock_quantity: 120,
            images: vec![image(
                "https://images.unsplash.com/photo-1471286174890-9c112ffca5b4?w=600&q=80",
                "Kids Fleece Hoodie",
            )],
            is_featured: false,
            discount: 0,
        },
        NewProduct {
            name: "Woven Leather Belt".to_string(),
            description: "Handwoven genuine leather belt with a braided pattern and \
                          brushed nickel buckle. Width 3.5cm."
                .to_string(),
            price: Money::from_cents(1499),
            category: Category::Accessories,
            sub_category: Some("Belts".to_string()),
            sizes: vec![Size::FreeSize],
            stock_quantity: 60,
            images: vec![image(
                "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=600&q=80",
                "Woven Leather Belt",
            )],
            is_featured: false,
            discount: 0,
        },
        NewProduct {
            name: "Canvas Tote Bag".to_string(),
            description: "Minimalist heavy-duty canvas tote with an interior zip pocket \
                          and reinforced handles. 15-litre capacity."
                .to_string(),
            price: Money::from_cents(1199),
            category: Category::Accessories,
            sub_category: Some("Bags".to_string()),
            sizes: vec![Size::FreeSize],
            stock_quantity: 90,
            images: vec![image(
                "https://images.unsplash.com/photo-1544816155-12df9643f363?w=600&q=80",
                "Canvas Tote Bag",
            )],
            is_featured: true,
            discount: 20,
        },
        NewProduct {
            name: "Suede Chelsea Boots".to_string(),
            description: "Classic Chelsea boots in premium suede with elastic side panels \
                          and a stacked rubber sole."
                .to_string(),
            price: Money::from_cents(6999),
            category: Category::Footwear,
            sub_category: Some("Boots".to_string()),
            sizes: vec![Size::S, Size::M, Size::L, Size::XL],
            stock_quantity: 30,
            images: vec![image(
                "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=600&q=80",
                "Suede Chelsea Boots",
            )],
            is_featured: true,
            discount: 0,
        },
        NewProduct {
            name: "Slip-On Canvas Sneakers".to_string(),
            description: "Effortless canvas slip-ons with a vulcanised rubber sole. Clean, \
                          flat, built for all-day comfort."
                .to_string(),
            price: Money::from_cents(2499),
            category: Category::Footwear,
            sub_category: Some("Sneakers".to_string()),
            sizes: vec![Size::XS, Size::S, Size::M, Size::L, Size::XL],
            stock_quantity: 80,
            images: vec![image(
                "https://images.unsplash.com/photo-1525966222134-fcfa99b8ae77?w=600&q=80",
                "Canvas Slip-On Sneakers",
            )],
            is_featured: false,
            discount: 0,
        },
    ]
}

/// Inserts the demo catalog. Skips seeding entirely when the catalog
/// already has products, so restarts do not duplicate it.
pub async fn seed_demo_catalog<S: CatalogStore>(store: &S) -> Result<u64> {
    let existing = store
        .list_products(&domain::storage::ProductQuery::default())
        .await?;
    if existing.total > 0 {
        tracing::info!(count = existing.total, "catalog already seeded, skipping");
        return Ok(0);
    }

    let mut inserted = 0u64;
    for input in demo_products() {
        // demo inputs are statically valid
        if let Ok(product) = Product::new(input) {
            store.insert_product(&product).await?;
            inserted += 1;
        }
    }

    tracing::info!(count = inserted, "seeded demo catalog");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use domain::storage::ProductQuery;

    #[tokio::test]
    async fn seeds_once() {
        let store = MemoryStore::new();
        let first = seed_demo_catalog(&store).await.unwrap();
        assert!(first > 0);
        let second = seed_demo_catalog(&store).await.unwrap();
        assert_eq!(second, 0);

        let page = store
            .list_products(&ProductQuery {
                limit: 100,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, first);
    }

    #[test]
    fn demo_inputs_all_validate() {
        for input in demo_products() {
            assert!(Product::new(input).is_ok());
        }
    }
}
