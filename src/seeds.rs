//! Built-in sample problem bank.
//!
//! Guarantees the app has a usable catalog even without external config.
//! Inserted idempotently (existing titles and level numbers are skipped), so
//! the seed endpoint can be hit repeatedly.

use serde_json::json;

use crate::config::{LevelCfg, ProblemCfg};
use crate::domain::{Criteria, Difficulty};

fn criteria(v: serde_json::Value) -> Criteria {
  match v {
    serde_json::Value::Object(m) => m,
    _ => Criteria::new(),
  }
}

fn level(n: u32, description: &str, c: serde_json::Value) -> LevelCfg {
  LevelCfg {
    level_number: n,
    level_description: description.into(),
    evaluation_criteria: criteria(c),
  }
}

/// The full sample catalog: five classic low-level design interview problems
/// with cumulative leveled requirements.
pub fn sample_problems() -> Vec<ProblemCfg> {
  vec![
    ProblemCfg {
      id: None,
      title: "Library Management System".into(),
      description: "Design a system to manage books, members, and the book lending process in a library.".into(),
      difficulty: Difficulty::Medium,
      levels: vec![
        level(1, "Basic entities: Book, Member, Loan with simple relationships", json!({
          "required_entities": ["Book", "Member", "Loan"],
          "required_relationships": ["Member borrows Book", "Loan connects Book and Member"],
          "required_attributes": ["Book: title, author, ISBN", "Member: name, id", "Loan: due_date, loan_date"]
        })),
        level(2, "Add multiple library branches and branch management", json!({
          "required_entities": ["Book", "Member", "Loan", "Branch"],
          "required_relationships": ["Book belongs to Branch", "Member registered at Branch"],
          "required_attributes": ["Branch: name, address", "Book: branch_id"]
        })),
        level(3, "Add user authentication and role-based access", json!({
          "required_entities": ["Book", "Member", "Loan", "Branch", "User", "Role"],
          "required_relationships": ["User has Role", "Member has User account"],
          "required_attributes": ["User: username, password", "Role: name, permissions"]
        })),
        level(4, "Handle high load with caching and performance optimization", json!({
          "required_entities": ["Book", "Member", "Loan", "Branch", "User", "Role", "Cache"],
          "required_relationships": ["Cache stores frequently accessed data"],
          "required_attributes": ["Cache: key, value, expiry", "Performance monitoring"]
        })),
        level(5, "Add concurrency control and transaction management", json!({
          "required_entities": ["Book", "Member", "Loan", "Branch", "User", "Role", "Cache", "Transaction"],
          "required_relationships": ["Transaction manages multiple operations"],
          "required_attributes": ["Transaction: id, status, lock_mechanism"]
        })),
      ],
    },
    ProblemCfg {
      id: None,
      title: "Coffee Vending Machine".into(),
      description: "Design a coffee vending machine that can make different types of coffee drinks and handle payments.".into(),
      difficulty: Difficulty::Easy,
      levels: vec![
        level(1, "Basic coffee types and payment handling", json!({
          "required_entities": ["Coffee", "Payment", "VendingMachine"],
          "required_relationships": ["VendingMachine dispenses Coffee", "Payment processes transaction"],
          "required_attributes": ["Coffee: type, price", "Payment: amount, method"]
        })),
        level(2, "Add inventory management and ingredient tracking", json!({
          "required_entities": ["Coffee", "Payment", "VendingMachine", "Ingredient", "Inventory"],
          "required_relationships": ["Coffee uses Ingredients", "Inventory tracks Ingredient levels"],
          "required_attributes": ["Ingredient: name, quantity", "Inventory: threshold, alert"]
        })),
        level(3, "Add user preferences and customization options", json!({
          "required_entities": ["Coffee", "Payment", "VendingMachine", "Ingredient", "Inventory", "User", "Preference"],
          "required_relationships": ["User has Preferences", "Coffee customized based on Preference"],
          "required_attributes": ["Preference: sugar_level, milk_type", "User: id, preferences"]
        })),
      ],
    },
    ProblemCfg {
      id: None,
      title: "Ride-Sharing Service".into(),
      description: "Design the core components of a ride-sharing service like Uber/Lyft.".into(),
      difficulty: Difficulty::Hard,
      levels: vec![
        level(1, "Basic ride booking and driver assignment", json!({
          "required_entities": ["User", "Driver", "Ride", "Location"],
          "required_relationships": ["User books Ride", "Driver assigned to Ride", "Ride has pickup and dropoff"],
          "required_attributes": ["Ride: status, fare", "Location: latitude, longitude"]
        })),
        level(2, "Add payment processing and fare calculation", json!({
          "required_entities": ["User", "Driver", "Ride", "Location", "Payment", "FareCalculator"],
          "required_relationships": ["Payment processes Ride fare", "FareCalculator calculates based on distance/time"],
          "required_attributes": ["Payment: amount, status", "FareCalculator: base_rate, multiplier"]
        })),
        level(3, "Add real-time tracking and driver availability", json!({
          "required_entities": ["User", "Driver", "Ride", "Location", "Payment", "FareCalculator", "Tracking"],
          "required_relationships": ["Tracking monitors Driver location", "Driver availability affects assignment"],
          "required_attributes": ["Tracking: real_time_location", "Driver: availability_status"]
        })),
        level(4, "Add surge pricing and demand management", json!({
          "required_entities": ["User", "Driver", "Ride", "Location", "Payment", "FareCalculator", "Tracking", "SurgePricing"],
          "required_relationships": ["SurgePricing adjusts fare based on demand", "Demand affects driver assignment"],
          "required_attributes": ["SurgePricing: multiplier, area", "Demand: zone, time_period"]
        })),
        level(5, "Add safety features and emergency handling", json!({
          "required_entities": ["User", "Driver", "Ride", "Location", "Payment", "FareCalculator", "Tracking", "SurgePricing", "Safety"],
          "required_relationships": ["Safety monitors ride", "Emergency system handles incidents"],
          "required_attributes": ["Safety: emergency_button, sos", "Emergency: incident_type, response"]
        })),
      ],
    },
    ProblemCfg {
      id: None,
      title: "Parking Lot System".into(),
      description: "Design a parking lot system that can manage multiple levels, different vehicle types, and payments.".into(),
      difficulty: Difficulty::Medium,
      levels: vec![
        level(1, "Basic parking spot management and vehicle entry/exit", json!({
          "required_entities": ["ParkingSpot", "Vehicle", "ParkingLot"],
          "required_relationships": ["Vehicle parks in ParkingSpot", "ParkingLot contains ParkingSpots"],
          "required_attributes": ["ParkingSpot: status, spot_number", "Vehicle: license_plate, entry_time"]
        })),
        level(2, "Add multiple levels and different vehicle types", json!({
          "required_entities": ["ParkingSpot", "Vehicle", "ParkingLot", "Level", "VehicleType"],
          "required_relationships": ["Level contains ParkingSpots", "Vehicle has VehicleType"],
          "required_attributes": ["Level: level_number, capacity", "VehicleType: size, rate"]
        })),
        level(3, "Add payment processing and time-based pricing", json!({
          "required_entities": ["ParkingSpot", "Vehicle", "ParkingLot", "Level", "VehicleType", "Payment", "Pricing"],
          "required_relationships": ["Payment calculates based on time", "Pricing varies by time/type"],
          "required_attributes": ["Payment: amount, duration", "Pricing: hourly_rate, daily_rate"]
        })),
        level(4, "Add reservation system and premium parking", json!({
          "required_entities": ["ParkingSpot", "Vehicle", "ParkingLot", "Level", "VehicleType", "Payment", "Pricing", "Reservation"],
          "required_relationships": ["Reservation reserves ParkingSpot", "Premium spots have higher rates"],
          "required_attributes": ["Reservation: start_time, end_time", "Premium: spot_type, additional_cost"]
        })),
      ],
    },
    ProblemCfg {
      id: None,
      title: "Hotel Booking System".into(),
      description: "Design a system for managing hotel room bookings, check-ins, and check-outs.".into(),
      difficulty: Difficulty::Medium,
      levels: vec![
        level(1, "Basic room booking and guest management", json!({
          "required_entities": ["Room", "Guest", "Booking"],
          "required_relationships": ["Guest books Room", "Booking manages Room availability"],
          "required_attributes": ["Room: number, type, price", "Guest: name, contact", "Booking: check_in, check_out"]
        })),
        level(2, "Add room types, amenities, and pricing tiers", json!({
          "required_entities": ["Room", "Guest", "Booking", "RoomType", "Amenity"],
          "required_relationships": ["Room has RoomType", "RoomType includes Amenities"],
          "required_attributes": ["RoomType: name, base_price", "Amenity: name, cost"]
        })),
        level(3, "Add check-in/check-out process and room service", json!({
          "required_entities": ["Room", "Guest", "Booking", "RoomType", "Amenity", "CheckIn", "RoomService"],
          "required_relationships": ["CheckIn processes Guest arrival", "RoomService serves Room"],
          "required_attributes": ["CheckIn: time, staff", "RoomService: order_type, delivery_time"]
        })),
        level(4, "Add loyalty program and special offers", json!({
          "required_entities": ["Room", "Guest", "Booking", "RoomType", "Amenity", "CheckIn", "RoomService", "LoyaltyProgram"],
          "required_relationships": ["Guest enrolled in LoyaltyProgram", "LoyaltyProgram provides discounts"],
          "required_attributes": ["LoyaltyProgram: points, tier", "SpecialOffer: discount_percentage, conditions"]
        })),
      ],
    },
  ]
}
